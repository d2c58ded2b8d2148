pub mod active_set;
pub mod controller;
pub mod policy;
pub mod ticket;

pub use active_set::{ActiveCamera, ActiveSet, ImageState, Residency};
pub use controller::*;
pub use policy::*;
pub use ticket::*;
