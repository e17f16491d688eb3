//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::output::traits::OutputResult;
use crate::state::RequestState;
use crate::storage::Storage;
use std::collections::HashMap;

/// Harvest statistics summary
#[derive(Debug, Clone, Default)]
pub struct HarvestStatistics {
    /// Total number of requests ever queued
    pub total_requests: u64,

    /// Count of requests by state
    pub requests_by_state: HashMap<RequestState, u64>,

    /// Total number of extracted records
    pub total_records: u64,

    /// Records per difficulty label, most common first
    pub records_by_difficulty: Vec<(String, u64)>,

    /// Tag usage, most common first
    pub top_tags: Vec<(String, u64)>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> OutputResult<HarvestStatistics> {
    let mut requests_by_state = HashMap::new();
    for state in RequestState::all_states() {
        let count = storage.count_requests_by_state(state)?;
        if count > 0 {
            requests_by_state.insert(state, count);
        }
    }

    Ok(HarvestStatistics {
        total_requests: storage.count_total_requests()?,
        requests_by_state,
        total_records: storage.count_records()?,
        records_by_difficulty: storage.count_records_by_difficulty()?,
        top_tags: storage.count_tags()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Requests ({} total):", stats.total_requests);
    for state in RequestState::all_states() {
        let count = stats.requests_by_state.get(&state).copied().unwrap_or(0);
        let percentage = if stats.total_requests > 0 {
            (count as f64 / stats.total_requests as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    println!("Records: {}", stats.total_records);
    for (difficulty, count) in &stats.records_by_difficulty {
        println!("  {}: {}", difficulty, count);
    }
    println!();

    if !stats.top_tags.is_empty() {
        println!("Top Tags:");
        for (tag, count) in stats.top_tags.iter().take(10) {
            println!("  {}: {}", tag, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ChallengeRecord, CrawlRequest};
    use crate::storage::SqliteStorage;
    use url::Url;

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_request(&CrawlRequest::listing(
                &Url::parse("https://edabit.com/challenges").unwrap(),
            ))
            .unwrap();
        storage.lease_next_request().unwrap();
        storage
            .insert_record(&ChallengeRecord {
                source_url: "https://edabit.com/challenge/a".to_string(),
                challenge_id: Some("a".to_string()),
                author_id: None,
                author_url: None,
                difficulty: "Easy".to_string(),
                title: "A".to_string(),
                tags: vec!["math".to_string()],
                instructions: String::new(),
                code: "x".to_string(),
                tests: "y".to_string(),
            })
            .unwrap();

        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.requests_by_state.get(&RequestState::InProgress), Some(&1));
        assert_eq!(stats.requests_by_state.get(&RequestState::Pending), None);
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.records_by_difficulty, vec![("Easy".to_string(), 1)]);
        assert_eq!(stats.top_tags, vec![("math".to_string(), 1)]);
    }
}
