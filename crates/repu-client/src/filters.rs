use serde::{Deserialize, Serialize};

use crate::params::{clean_params, Params};

/// Dashboard-wide filters shared by every view: product and date window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalFilters {
    pub product_id: Option<i64>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl GlobalFilters {
    /// Both bounds, or nothing.
    pub fn date_range(&self) -> Option<(String, String)> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Some((start.clone(), end.clone())),
            _ => None,
        }
    }

    /// `None` clears both bounds; a blank bound is stored as unset.
    pub fn set_date_range(&mut self, range: Option<(String, String)>) {
        let (start, end) = match range {
            Some((start, end)) => (non_blank(start), non_blank(end)),
            None => (None, None),
        };
        self.start = start;
        self.end = end;
    }

    /// Sanitized `{productId, start, end}`.
    pub fn common_params(&self) -> Params {
        common_params(self.product_id, self.start.as_deref(), self.end.as_deref())
    }
}

pub fn common_params(product_id: Option<i64>, start: Option<&str>, end: Option<&str>) -> Params {
    clean_params(
        &Params::new()
            .with_opt("productId", product_id)
            .with_opt("start", start)
            .with_opt("end", end),
    )
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
