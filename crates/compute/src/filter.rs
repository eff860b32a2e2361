//! Exact-match filters over ride summaries.

use serde::Deserialize;

use crate::ride::RideSummary;

/// Optional equality constraint per summary field. An absent field
/// matches everything.
///
/// For nullable numeric fields a present constraint only matches rows
/// whose value is non-null and equal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub current_value: Option<i64>,
    pub mean: Option<f64>,
    pub stdev: Option<f64>,
    pub is_open: Option<bool>,
    pub recently_opened: Option<bool>,
    pub is_unusually_low: Option<bool>,
}

fn field_matches<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
    want.as_ref().map_or(true, |w| w == have)
}

fn nullable_matches<T: PartialEq>(want: &Option<T>, have: &Option<T>) -> bool {
    match want {
        None => true,
        Some(w) => have.as_ref() == Some(w),
    }
}

impl SnapshotFilter {
    /// Filter on the open flag only.
    pub fn open(is_open: bool) -> Self {
        Self {
            is_open: Some(is_open),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, row: &RideSummary) -> bool {
        field_matches(&self.id, &row.id)
            && field_matches(&self.name, &row.name)
            && nullable_matches(&self.current_value, &row.current_value)
            && nullable_matches(&self.mean, &row.mean)
            && nullable_matches(&self.stdev, &row.stdev)
            && field_matches(&self.is_open, &row.is_open)
            && field_matches(&self.recently_opened, &row.recently_opened)
            && field_matches(&self.is_unusually_low, &row.is_unusually_low)
    }
}
