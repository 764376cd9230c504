use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pressure above which a reading is at least a warning.
pub const WARNING_PRESSURE: f64 = 600.0;
/// Pressure above which a reading can be critical.
pub const CRITICAL_PRESSURE: f64 = 800.0;
/// Temperature above which a high-pressure reading is critical.
pub const CRITICAL_TEMPERATURE: f64 = 300.0;

/// Health classification attached to every ingested row as its `Status` cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// Pressure and temperature are both over their critical thresholds.
    Critical,
    /// Pressure is over the warning threshold.
    Warning,
    Ok,
    /// The file lacks a `Pressure` or `Temperature` column.
    Unknown,
}

impl HealthStatus {
    pub const ALL: &'static [HealthStatus] =
        &[Self::Critical, Self::Warning, Self::Ok, Self::Unknown];

    /// Classify a single reading. Missing values are passed in as `0.0`.
    pub fn classify(pressure: f64, temperature: f64) -> Self {
        if pressure > CRITICAL_PRESSURE && temperature > CRITICAL_TEMPERATURE {
            Self::Critical
        } else if pressure > WARNING_PRESSURE {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Ok => "OK",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseHealthStatusError {
    invalid: String,
}

impl fmt::Display for ParseHealthStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            HealthStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseHealthStatusError {}

impl FromStr for HealthStatus {
    type Err = ParseHealthStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRITICAL" => Ok(Self::Critical),
            "WARNING" => Ok(Self::Warning),
            "OK" => Ok(Self::Ok),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(ParseHealthStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
