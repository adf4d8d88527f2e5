//! Interactive street-imagery session over a pluggable map surface.

pub mod config;
pub mod controls;
pub mod error;
pub mod session;

pub use config::{ViewerConfig, Viewport};
pub use controls::{Control, Controls};
pub use error::ViewerError;
pub use session::{DownloadOutcome, MapSession, SurfaceEvent};
