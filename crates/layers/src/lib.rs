pub mod filter;
pub mod headless;
pub mod imagery;
pub mod layer;
pub mod query;
pub mod surface;
pub mod symbology;

pub use filter::*;
pub use headless::*;
pub use layer::*;
pub use surface::*;
