use layers::SurfaceError;
use streaming::DownloadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("map surface rejected an update: {0}")]
    Surface(#[from] SurfaceError),
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),
}
