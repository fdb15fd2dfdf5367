//! 2D vector.

use serde::{Deserialize, Serialize};

/// A generic two-component vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector2<T> {
    /// X component.
    pub x: T,
    /// Z component (horizontal plane convention).
    pub z: T,
}

impl<T> Vector2<T> {
    /// Creates a new vector from its components.
    pub const fn new(x: T, z: T) -> Self {
        Self { x, z }
    }
}
