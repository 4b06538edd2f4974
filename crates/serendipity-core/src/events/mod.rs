//! Event candidates: normalization, aggregation and interest scoring.

mod aggregator;
mod candidate;
mod normalizer;

pub use aggregator::{
    dedup_candidates, interest_score, score_candidates, AggregationReport, EventAggregator,
    SourceReport,
};
pub use candidate::{EventCandidate, RawEventRecord, Timeframe};
pub use normalizer::{extract_records, normalize, normalize_record, parse_event_datetime};
