use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    #[error("edge {edge} references node {missing}, which is not part of the fetched nodes")]
    UnknownEndpoint { edge: String, missing: String },

    #[error("view observer stage {stage} dropped its continuation for data version {version}")]
    ContinuationDropped { version: u64, stage: usize },

    #[error("zoom must be positive and finite, got {0}")]
    InvalidZoom(f64),

    #[error("total {axis} must be positive and finite, got {value}")]
    InvalidExtent { axis: &'static str, value: f64 },

    #[error("unknown edge direction {0:?}, expected one of '-', '=', '<', '>'")]
    InvalidDirection(String),
}
