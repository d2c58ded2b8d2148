pub mod config;
pub mod node;
pub mod projector;
pub mod proximity;
pub mod simulation;

pub use config::LayoutConfig;
pub use node::{NodeFrame, NodeInput, STRAIN_HIGHLIGHT_PX};
pub use projector::{MercatorProjector, Projector};
pub use proximity::{camera_scale, proximity_scale};
pub use simulation::Simulation;
