use std::sync::Arc;

use clap::Args;
use serendipity_core::{DigestScheduler, LogNotifier};
use tracing::info;

use super::{open_engine, runtime, CliResult};

#[derive(Args)]
pub struct DigestArgs {
    /// Run a single pass and exit instead of scheduling
    #[arg(long)]
    pub once: bool,
}

pub fn run(args: DigestArgs) -> CliResult {
    let engine = open_engine()?;
    let config = engine.config().scheduler.clone();
    info!(
        interval_secs = config.interval_secs,
        check_secs = config.check_secs,
        once = args.once,
        "starting digest"
    );
    let scheduler = DigestScheduler::new(Arc::new(engine), Arc::new(LogNotifier), config);

    let rt = runtime()?;
    if args.once {
        let summary = rt.block_on(scheduler.run_once());
        println!(
            "users: {}, notified: {}, failed: {}",
            summary.users, summary.notified, summary.failed
        );
    } else {
        rt.block_on(scheduler.run_forever());
    }
    Ok(())
}
