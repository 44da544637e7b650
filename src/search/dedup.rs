use crate::transport::Record;
use std::collections::HashSet;

/// Keep the first record for each trimmed transcription, in original order.
pub fn unique_by_transcription(records: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let before = records.len();

    let unique: Vec<Record> = records
        .into_iter()
        .filter(|record| seen.insert(record.dedup_key().to_string()))
        .collect();

    if unique.len() < before {
        tracing::debug!("Dropped {} duplicate search hit(s)", before - unique.len());
    }
    unique
}
