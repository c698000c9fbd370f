use crate::domain::entities::daily_rollup::DailyRollup;
use crate::domain::entities::detection::Detection;
use crate::domain::error::DomainError;
use crate::domain::ports::detection_repository::{DetectionFilter, DetectionRepository};
use crate::domain::ports::rollup_repository::RollupRepository;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

pub struct AggregateUseCase {
    detections: Arc<dyn DetectionRepository>,
    rollups: Arc<dyn RollupRepository>,
}

impl AggregateUseCase {
    pub fn new(detections: Arc<dyn DetectionRepository>, rollups: Arc<dyn RollupRepository>) -> Self {
        Self { detections, rollups }
    }

    /// Recompute and store every rollup for one UTC calendar date.
    pub fn rollup(&self, date: NaiveDate) -> Result<Vec<DailyRollup>, DomainError> {
        let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let detections = self.detections.query(&DetectionFilter {
            since: Some(start),
            until: Some(start + Duration::days(1)),
            ..DetectionFilter::default()
        })?;

        let rollups = summarize_day(date, &detections);
        self.rollups.replace_day(date, &rollups)?;
        info!(%date, symbols = rollups.len(), detections = detections.len(), "daily rollup written");
        Ok(rollups)
    }

    /// Inclusive on both ends.
    pub fn rollup_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRollup>, DomainError> {
        if from > to {
            return Err(DomainError::InvalidInput(format!("{from} is after {to}")));
        }
        let mut all = Vec::new();
        let mut date = from;
        while date <= to {
            all.extend(self.rollup(date)?);
            date += Duration::days(1);
        }
        Ok(all)
    }

    pub fn top(&self, date: NaiveDate, limit: usize) -> Result<Vec<DailyRollup>, DomainError> {
        self.rollups.for_day(date, Some(limit))
    }
}

/// Group one day's detections by symbol, busiest symbol first.
pub fn summarize_day(date: NaiveDate, detections: &[Detection]) -> Vec<DailyRollup> {
    let mut by_symbol: HashMap<&str, Vec<&Detection>> = HashMap::new();
    for detection in detections {
        by_symbol.entry(detection.symbol.as_str()).or_default().push(detection);
    }

    let mut rollups: Vec<DailyRollup> = by_symbol
        .into_iter()
        .filter_map(|(symbol, group)| {
            let first = group.first()?;
            let count = group.len();
            let authors: HashSet<&str> = group.iter().map(|d| d.author_id.as_str()).collect();
            let sum: f64 = group.iter().map(|d| d.final_confidence).sum();
            Some(DailyRollup {
                symbol: symbol.to_string(),
                calendar_date: date,
                mention_count: count as u64,
                unique_authors: authors.len() as u64,
                avg_confidence: sum / count as f64,
                min_confidence: group.iter().map(|d| d.final_confidence).fold(f64::INFINITY, f64::min),
                max_confidence: group.iter().map(|d| d.final_confidence).fold(f64::NEG_INFINITY, f64::max),
                first_seen: group.iter().map(|d| d.observed_at).min().unwrap_or(first.observed_at),
                last_seen: group.iter().map(|d| d.observed_at).max().unwrap_or(first.observed_at),
            })
        })
        .collect();

    rollups.sort_by(|a, b| {
        b.mention_count
            .cmp(&a.mention_count)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    rollups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::extraction_method::ExtractionMethod;
    use chrono::DateTime;

    fn detection(symbol: &str, author: &str, confidence: f64, at: DateTime<Utc>) -> Detection {
        Detection {
            id: uuid::Uuid::new_v4().to_string(),
            message_id: uuid::Uuid::new_v4().to_string(),
            channel_id: "chat".into(),
            author_id: author.into(),
            symbol: symbol.into(),
            extraction_method: ExtractionMethod::Cashtag,
            final_confidence: confidence,
            context_strength: 0.5,
            position: 0,
            detected_text: format!("${symbol}"),
            exchange: None,
            observed_at: at,
            created_at: at,
        }
    }

    #[test]
    fn test_summarize_day_groups_and_orders() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        let detections = vec![
            detection("XPON", "a", 0.95, t),
            detection("XPON", "b", 0.85, t + Duration::minutes(5)),
            detection("XPON", "a", 0.90, t + Duration::minutes(9)),
            detection("SLDP", "c", 0.95, t + Duration::minutes(1)),
        ];

        let rollups = summarize_day(date, &detections);
        assert_eq!(rollups.len(), 2);
        let xpon = &rollups[0];
        assert_eq!(xpon.symbol, "XPON");
        assert_eq!(xpon.mention_count, 3);
        assert_eq!(xpon.unique_authors, 2);
        assert!((xpon.avg_confidence - 0.9).abs() < 1e-9);
        assert_eq!(xpon.min_confidence, 0.85);
        assert_eq!(xpon.max_confidence, 0.95);
        assert_eq!(xpon.first_seen, t);
        assert_eq!(xpon.last_seen, t + Duration::minutes(9));
        assert_eq!(rollups[1].symbol, "SLDP");
    }

    #[test]
    fn test_summarize_empty_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(summarize_day(date, &[]).is_empty());
    }
}
