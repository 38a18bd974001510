//! portfolio.daily_counters.v1 input schema
//!
//! Day records arrive already aggregated by the ingestion service. This module
//! only parses them; range and sign validation belongs to ingestion.

use chrono::NaiveDate;

use crate::error::AnalyticsError;
use crate::types::DailyCounters;

/// Current input schema version
pub const SCHEMA_VERSION: &str = "portfolio.daily_counters.v1";

/// Parser for batches of day records
pub struct CountersAdapter;

impl CountersAdapter {
    /// Parse newline-delimited JSON, one record per line
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<DailyCounters>, AnalyticsError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<DailyCounters>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(AnalyticsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse a JSON array of records
    pub fn parse_array(json: &str) -> Result<Vec<DailyCounters>, AnalyticsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Find the record scored for `portfolio_id` on `date`
    pub fn find_day<'a>(
        records: &'a [DailyCounters],
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Option<&'a DailyCounters> {
        records
            .iter()
            .find(|record| record.portfolio_id == portfolio_id && record.date == date)
    }

    /// Records belonging to one portfolio, usable as its baseline history.
    ///
    /// The scored day may stay in the result; the baseline calculator skips it.
    pub fn portfolio_history(records: &[DailyCounters], portfolio_id: &str) -> Vec<DailyCounters> {
        records
            .iter()
            .filter(|record| record.portfolio_id == portfolio_id)
            .cloned()
            .collect()
    }

    /// Distinct portfolio ids in a batch, sorted
    pub fn portfolios(records: &[DailyCounters]) -> Vec<String> {
        let mut ids: Vec<String> = records
            .iter()
            .map(|record| record.portfolio_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Distinct (portfolio, date) keys in a batch, by portfolio then oldest first
    pub fn day_keys(records: &[DailyCounters]) -> Vec<(String, NaiveDate)> {
        let mut keys: Vec<(String, NaiveDate)> = records
            .iter()
            .map(|record| (record.portfolio_id.clone(), record.date))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}
