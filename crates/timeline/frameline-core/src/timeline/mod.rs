//! Per-target timeline tables consulted by the resolution pass.

pub mod actions;
pub mod presence;
pub mod tween;

pub use actions::*;
pub use presence::*;
pub use tween::*;
