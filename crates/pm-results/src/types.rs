//! Result data types.

use serde::{Deserialize, Serialize};

use crate::ResultsResult;
use crate::time_sorted::TimeSortedList;

/// Per-joint row: `x, y, vx, vy, ax, ay`.
pub type JointRow = [f64; 6];

/// Per-link row: `angle, angular velocity, angular acceleration`.
pub type LinkRow = [f64; 3];

pub type JointParameters = TimeSortedList<Vec<JointRow>>;
pub type LinkParameters = TimeSortedList<Vec<LinkRow>>;

/// Extent of the input coordinate reached by the two sweeps.
///
/// `start` is moved by the backward sweep, `end` by the forward one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRange {
    pub start: f64,
    pub end: f64,
}

impl InputRange {
    pub fn at(value: f64) -> Self {
        Self {
            start: value,
            end: value,
        }
    }

    /// Widen the range to include `value`.
    pub fn include(&mut self, value: f64) {
        if value < self.start {
            self.start = value;
        }
        if value > self.end {
            self.end = value;
        }
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Has the input travelled at least `travel` in total?
    pub fn covers(&self, travel: f64) -> bool {
        self.span() >= travel
    }
}

/// Short machine-readable summary of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub degrees_of_freedom: i32,
    pub dyadic: bool,
    pub samples: usize,
    pub time_span: Option<(f64, f64)>,
    pub input_range: InputRange,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
}

impl RunSummary {
    pub fn to_json_pretty(&self) -> ResultsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> ResultsResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
