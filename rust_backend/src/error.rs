//! Error types for visibility computations.
//!
//! Only precondition violations and degenerate geometry are errors. An event
//! that simply does not happen inside a window is reported through `Option`
//! or [`crate::services::target_window::Circumstance::Never`], never here.

/// Result type for visibility operations
pub type VisibilityResult<T> = Result<T, VisibilityError>;

/// Error type for visibility operations
#[derive(Debug, thiserror::Error)]
pub enum VisibilityError {
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid sample series: {0}")]
    InvalidSeries(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Horizon parse error: {0}")]
    HorizonParse(String),

    #[error("Unable to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl VisibilityError {
    /// `true` for caller mistakes (category 1), as opposed to geometry or I/O.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            VisibilityError::InvalidSample(_)
                | VisibilityError::InvalidSeries(_)
                | VisibilityError::InvalidArgument(_)
        )
    }
}
