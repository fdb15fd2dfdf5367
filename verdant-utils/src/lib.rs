//! Shared wrapper types and small helpers for the verdant workspace.

pub mod color;
pub mod math;
pub mod types;

pub use color::Rgb;
pub use types::{BlockPos, RegionPos, WorldId};
