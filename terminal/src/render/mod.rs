pub mod pitch;
pub mod standard_renderer;
pub mod traits;
pub mod types;
