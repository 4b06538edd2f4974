//! `serendipity suggest`: one ranking run for one user.

use clap::Args;
use serde_json::json;
use serendipity_core::events::parse_event_datetime;
use serendipity_core::{RankingRequest, RankingRun, SuggestionPayload, Timeframe};

use super::{open_engine, runtime, CliResult};

#[derive(Args)]
pub struct SuggestArgs {
    /// Profile id
    pub user_id: String,

    /// Goal to favor (repeatable)
    #[arg(long = "goal")]
    pub goals: Vec<String>,

    /// Only events starting at or after this time (RFC 3339 or a date)
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Only events starting at or before this time
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SuggestArgs) -> CliResult {
    let timeframe = match (&args.start, &args.end) {
        (Some(start), Some(end)) => Some(Timeframe::new(
            parse_event_datetime(start)?,
            parse_event_datetime(end)?,
        )?),
        _ => None,
    };
    let request = RankingRequest {
        goals: args.goals,
        timeframe,
    };

    let engine = open_engine()?;
    let run = runtime()?.block_on(engine.run(&args.user_id, &request))?;

    for failure in &run.failures {
        eprintln!("warning: {failure}");
    }

    if args.json {
        let failures: Vec<String> = run.failures.iter().map(ToString::to_string).collect();
        let out = json!({
            "userId": run.user_id,
            "generatedAt": run.generated_at,
            "actionable": run.actionable().len(),
            "suggestions": run.suggestions,
            "failures": failures,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_run(&run);
    }
    Ok(())
}

fn print_run(run: &RankingRun) {
    if run.suggestions.is_empty() {
        println!("No suggestions for {}.", run.user_id);
        return;
    }

    let actionable = run.actionable().len();
    for (i, s) in run.suggestions.iter().enumerate() {
        let marker = if i < actionable { "*" } else { " " };
        let headline = match &s.payload {
            SuggestionPayload::Event(e) => match e.start_time {
                Some(t) => format!("{} ({})", e.title, t.format("%Y-%m-%d %H:%M")),
                None => e.title.clone(),
            },
            SuggestionPayload::Connection(c) => format!("Meet {}", c.contact),
            SuggestionPayload::Nudge(n) => format!("{} ({})", n.action, n.timing),
        };
        println!("{marker} [{:.2}] {:<10} {headline}", s.priority, s.kind().as_str());
        println!("      {}", s.reasoning);
    }
}
