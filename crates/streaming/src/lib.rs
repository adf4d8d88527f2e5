pub mod api;
pub mod archive;
pub mod pipeline;
pub mod protocol;
pub mod sink;

pub use api::*;
pub use archive::*;
pub use pipeline::*;
pub use sink::*;
