use std::path::PathBuf;

/// Error type for the command-line front end
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Kp(#[from] kp_lib::KpError),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: no tracks or routes with points found", path.display())]
    NoRoute { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, CliError>;
