use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Malformed detection: expected 4, 5 or 6 values, got {len}")]
    MalformedDetection { len: usize },

    #[error("Frame order violated: frame {got} after frame {last}")]
    FrameOrder { last: i64, got: i64 },

    #[error("Cancelled after {processed} frames")]
    Cancelled { processed: usize },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}
