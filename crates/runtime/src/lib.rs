pub mod event_bus;
pub mod job;

pub use event_bus::*;
pub use job::*;
