use thiserror::Error;

/// Errors surfaced by training, configuration and search.
///
/// Per-iteration numeric conditions (out-of-bounds samples, clamp saturation,
/// exhausted iteration budgets) are handled where they occur and never show
/// up here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("insufficient training data: {0}")]
    TrainingDataInsufficient(String),

    #[error(
        "ill-conditioned profile covariance at level {level}, landmark {landmark} \
         (normalized determinant {determinant:.3e})"
    )]
    IllConditionedCovariance {
        level: usize,
        landmark: usize,
        determinant: f64,
    },

    #[error("landmark count mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("search cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no image has been set for searching")]
    NoImage,

    #[error("appearance model for level {0} has not been trained")]
    ModelNotTrained(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
