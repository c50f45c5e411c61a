//! Sorting mode for the menu structure view

use serde::{Deserialize, Serialize};

/// Display order of the menu structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortingMode {
    /// Positional order by `sort_order`; drag-and-drop enabled
    #[default]
    Manual,
    /// Name order; drag-and-drop disabled
    Alphabetical,
}

/// Field a listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    SortOrder,
    Name,
}

impl SortingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortingMode::Manual => "manual",
            SortingMode::Alphabetical => "alphabetical",
        }
    }

    /// Strict parse; anything but the two known names is rejected
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(SortingMode::Manual),
            "alphabetical" => Some(SortingMode::Alphabetical),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortingMode::Manual => SortingMode::Alphabetical,
            SortingMode::Alphabetical => SortingMode::Manual,
        }
    }

    pub fn is_alphabetical(&self) -> bool {
        matches!(self, SortingMode::Alphabetical)
    }

    pub fn is_drag_enabled(&self) -> bool {
        !self.is_alphabetical()
    }

    pub fn order_by(&self) -> SortField {
        match self {
            SortingMode::Manual => SortField::SortOrder,
            SortingMode::Alphabetical => SortField::Name,
        }
    }
}
