//! REST API handlers

pub mod features;
pub mod health;
pub mod shared;
pub mod subscription;
pub mod usage;

pub use features::*;
pub use health::*;
pub use subscription::*;
pub use usage::*;
