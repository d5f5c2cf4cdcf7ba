//! Reporting period definitions.

use serde::{Deserialize, Serialize};

/// Reporting period for fundamental financial data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    /// Annual reporting period.
    #[default]
    Annual,
    /// Quarterly reporting period.
    Quarterly,
}

impl PeriodType {
    /// Returns the query-parameter value providers expect for this period.
    #[must_use]
    pub const fn as_query_value(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarter",
        }
    }
}
