//! Per-place aggregates and the ranking report.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::rating::Rating;

/// First line of the rendered ranking report.
pub const REPORT_HEADER: &str = "Average Grade\t\tPlace\n";

/// Running totals for one place. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaceStats {
    pub total_grade: i128,
    pub count: u64,
}

impl PlaceStats {
    pub fn add(&mut self, grade: i64) {
        self.total_grade += i128::from(grade);
        self.count += 1;
    }

    /// Mean grade, or None when no grades were added.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total_grade as f64 / self.count as f64)
    }
}

/// One row of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceAverage {
    pub place: String,
    pub average: f64,
    pub count: u64,
}

/// Places ranked by descending average grade.
///
/// Places with equal averages have no defined relative order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingReport {
    pub entries: Vec<PlaceAverage>,
}

impl RatingReport {
    /// Builds the ranking from every rating in the ledger.
    pub fn from_ratings<'a>(ratings: impl IntoIterator<Item = &'a Rating>) -> Self {
        // Places are kept in first-seen order before sorting.
        let mut order: Vec<String> = Vec::new();
        let mut stats: HashMap<String, PlaceStats> = HashMap::new();

        for rating in ratings {
            stats
                .entry(rating.place.clone())
                .or_insert_with(|| {
                    order.push(rating.place.clone());
                    PlaceStats::default()
                })
                .add(rating.grade);
        }

        let mut entries: Vec<PlaceAverage> = order
            .into_iter()
            .filter_map(|place| {
                let place_stats = stats.get(&place)?;
                Some(PlaceAverage {
                    average: place_stats.average()?,
                    count: place_stats.count,
                    place,
                })
            })
            .collect();

        entries.sort_by(|a, b| b.average.total_cmp(&a.average));

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for RatingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REPORT_HEADER)?;
        for entry in &self.entries {
            writeln!(f, "{:.2}\t\t{}", entry.average, entry.place)?;
        }
        Ok(())
    }
}

/// Ratings for a single place together with their average grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceSummary {
    pub place: String,
    pub average: f64,
    pub ratings: Vec<Rating>,
}
