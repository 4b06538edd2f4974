//! Candidate normalizer: raw scraped strings to typed [`EventCandidate`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use super::candidate::{EventCandidate, RawEventRecord};
use crate::error::ParseError;
use crate::profile::{EventSourceConfig, SourceSelectors};
use crate::sources::Extractor;

enum Layout {
    Offset(&'static str),
    DateTime(&'static str),
    Date(&'static str),
}

/// Fallback layouts tried in order after ISO-8601. Naive values are read as UTC.
/// `%.f` also accepts a missing fraction.
const FALLBACK_LAYOUTS: &[Layout] = &[
    Layout::Offset("%Y-%m-%d %H:%M:%S%.f%:z"),
    Layout::DateTime("%Y-%m-%dT%H:%M:%S%.f"),
    Layout::DateTime("%Y-%m-%d %H:%M:%S%.f"),
    Layout::DateTime("%Y-%m-%dT%H:%M"),
    Layout::DateTime("%Y-%m-%d %H:%M"),
    Layout::DateTime("%Y%m%dT%H%M%SZ"),
    Layout::DateTime("%Y%m%dT%H%M%S"),
    Layout::DateTime("%m/%d/%Y %H:%M"),
    Layout::Date("%m/%d/%Y"),
    Layout::Date("%Y-%m-%d"),
    Layout::DateTime("%b %d, %Y %H:%M"),
    Layout::Date("%b %d, %Y"),
    Layout::DateTime("%d %b %Y %H:%M"),
    Layout::Date("%d %b %Y"),
];

/// Parse a scraped datetime string.
///
/// RFC 3339 / ISO-8601 with offset is tried first, then [`FALLBACK_LAYOUTS`];
/// the first layout that parses wins.
pub fn parse_event_datetime(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for layout in FALLBACK_LAYOUTS {
        let parsed = match layout {
            Layout::Offset(fmt) => DateTime::parse_from_str(raw, fmt)
                .ok()
                .map(|dt| dt.naive_utc()),
            Layout::DateTime(fmt) => NaiveDateTime::parse_from_str(raw, fmt).ok(),
            Layout::Date(fmt) => NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        };
        if let Some(naive) = parsed {
            return Ok(naive.and_utc());
        }
    }

    Err(ParseError::Datetime(raw.to_string()))
}

/// Pull index-aligned field strings out of a page.
///
/// One record per title element; the i-th description, datetime and venue
/// strings belong to the i-th title, missing ones are left empty.
pub fn extract_records(
    html: &str,
    selectors: &SourceSelectors,
    extractor: &dyn Extractor,
) -> Vec<RawEventRecord> {
    let field = |selector: &Option<String>| -> Vec<String> {
        selector
            .as_deref()
            .map(|s| extractor.extract(html, s))
            .unwrap_or_default()
    };

    let titles = field(&selectors.title);
    let descriptions = field(&selectors.description);
    let datetimes = field(&selectors.datetime);
    let venues = field(&selectors.location);

    let at = |values: &[String], i: usize| values.get(i).cloned().unwrap_or_default();

    titles
        .iter()
        .enumerate()
        .map(|(i, title)| RawEventRecord {
            title: title.clone(),
            description: at(&descriptions, i),
            datetime: at(&datetimes, i),
            venue: at(&venues, i),
        })
        .collect()
}

/// Turn one raw record into a candidate. Blank titles yield `EmptyTitle`.
pub fn normalize_record(
    source: &EventSourceConfig,
    record: &RawEventRecord,
    base_confidence: f64,
) -> Result<EventCandidate, ParseError> {
    let title = record.title.trim();
    if title.is_empty() {
        return Err(ParseError::EmptyTitle);
    }

    let start_time = if record.datetime.trim().is_empty() {
        None
    } else {
        match parse_event_datetime(&record.datetime) {
            Ok(t) => Some(t),
            Err(e) => {
                debug!(url = %source.url, title, error = %e, "leaving start time empty");
                None
            }
        }
    };

    let venue = record.venue.trim();
    Ok(EventCandidate {
        title: title.to_string(),
        description: record.description.trim().to_string(),
        url: source.url.clone(),
        start_time,
        end_time: None,
        venue: (!venue.is_empty()).then(|| venue.to_string()),
        source: source.url.clone(),
        confidence: base_confidence,
    })
}

/// Normalize every record of one source, silently dropping blank titles.
pub fn normalize(
    source: &EventSourceConfig,
    records: &[RawEventRecord],
    base_confidence: f64,
) -> Vec<EventCandidate> {
    records
        .iter()
        .filter_map(|r| normalize_record(source, r, base_confidence).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SelectorExtractor;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn parses_iso_with_offset() {
        assert_eq!(
            parse_event_datetime("2025-03-10T18:00:00+02:00").unwrap(),
            utc(2025, 3, 10, 16, 0)
        );
        assert_eq!(
            parse_event_datetime("2025-03-10T18:00:00Z").unwrap(),
            utc(2025, 3, 10, 18, 0)
        );
    }

    #[test]
    fn parses_fallback_layouts() {
        let cases = [
            ("2025-03-10T18:30:15", Utc.with_ymd_and_hms(2025, 3, 10, 18, 30, 15).unwrap()),
            ("2025-03-10T18:30", utc(2025, 3, 10, 18, 30)),
            ("03/10/2025 18:30", utc(2025, 3, 10, 18, 30)),
            ("03/10/2025", utc(2025, 3, 10, 0, 0)),
            ("2025-03-10", utc(2025, 3, 10, 0, 0)),
            ("Mar 10, 2025", utc(2025, 3, 10, 0, 0)),
            ("Mar 10, 2025 18:30", utc(2025, 3, 10, 18, 30)),
            ("10 Mar 2025 18:30", utc(2025, 3, 10, 18, 30)),
            ("10 Mar 2025", utc(2025, 3, 10, 0, 0)),
            ("2025-03-10T18:30:00.000", utc(2025, 3, 10, 18, 30)),
            ("2025-03-10 18:30:00", utc(2025, 3, 10, 18, 30)),
            (
                "2025-03-10 18:30:00.250",
                utc(2025, 3, 10, 18, 30) + chrono::Duration::milliseconds(250),
            ),
            ("2025-03-10 18:30", utc(2025, 3, 10, 18, 30)),
            ("2025-03-10 20:30:00+02:00", utc(2025, 3, 10, 18, 30)),
            ("20250310T183000Z", utc(2025, 3, 10, 18, 30)),
            ("20250310T183000", utc(2025, 3, 10, 18, 30)),
        ];
        for (raw, expected) in cases {
            assert_eq!(parse_event_datetime(raw).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn unparseable_datetime_is_an_error() {
        assert_eq!(
            parse_event_datetime("next Tuesday-ish"),
            Err(ParseError::Datetime("next Tuesday-ish".into()))
        );
    }

    #[test]
    fn normalize_drops_blank_titles_and_keeps_bad_dates() {
        let source = EventSourceConfig::new("https://example.com/events", "meetup");
        let records = vec![
            RawEventRecord {
                title: "  ".into(),
                ..Default::default()
            },
            RawEventRecord {
                title: "AI Meetup".into(),
                description: "Talks".into(),
                datetime: "sometime soon".into(),
                venue: String::new(),
            },
        ];

        let out = normalize(&source, &records, 0.7);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "AI Meetup");
        assert_eq!(out[0].start_time, None);
        assert_eq!(out[0].venue, None);
        assert_eq!(out[0].confidence, 0.7);
        assert_eq!(out[0].source, "https://example.com/events");
    }

    #[test]
    fn extract_records_aligns_fields_by_index() {
        let html = r#"
            <h2 class="t">First</h2><span class="d">2025-03-10</span><p class="v">Hall</p>
            <h2 class="t">Second</h2>
        "#;
        let selectors = SourceSelectors {
            title: Some("h2.t".into()),
            description: None,
            datetime: Some("span.d".into()),
            location: Some("p.v".into()),
        };

        let records = extract_records(html, &selectors, &SelectorExtractor::new());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].datetime, "2025-03-10");
        assert_eq!(records[0].venue, "Hall");
        assert_eq!(records[1].title, "Second");
        assert!(records[1].datetime.is_empty());
        assert!(records[1].description.is_empty());
    }
}
