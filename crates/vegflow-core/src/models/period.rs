use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar month, inclusive on both ends, as used to filter imagery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthlyRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// `YYYY-MM`, the file-naming key for this month
    pub label: String,
}

impl MonthlyRange {
    /// Number of days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Raster file name for this month, `YYYY-MM.tif`
    pub fn file_name(&self) -> String {
        format!("{}.tif", self.label)
    }
}

impl std::fmt::Display for MonthlyRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} to {})", self.label, self.start, self.end)
    }
}
