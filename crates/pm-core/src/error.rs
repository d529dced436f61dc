use thiserror::Error;

pub type PmResult<T> = Result<T, PmError>;

#[derive(Error, Debug)]
pub enum PmError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
