//! pm-results: time-indexed simulation output and its export.

pub mod export;
pub mod layout;
pub mod time_sorted;
pub mod types;

pub use export::write_csv;
pub use layout::ColumnLayout;
pub use time_sorted::TimeSortedList;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("A sample already exists at t = {time}")]
    DuplicateTime { time: f64 },

    #[error("Sample time is not finite: {time}")]
    NonFiniteTime { time: f64 },

    #[error("Sample at t = {time} has {found} rows, expected {expected}")]
    ShapeMismatch {
        time: f64,
        expected: usize,
        found: usize,
    },
}
