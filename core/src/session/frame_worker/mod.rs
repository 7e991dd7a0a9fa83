pub mod types;
pub mod render;

pub use types::*;
pub use render::*;
