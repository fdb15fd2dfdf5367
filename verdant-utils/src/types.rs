// Wrapper types making it harder to accidentally use the wrong underlying type.

use crate::math::{vector2::Vector2, vector3::Vector3};

/// Identifier of one world (dimension) on the host server.
pub type WorldId = uuid::Uuid;

/// A block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos(pub Vector3<i32>);

/// A region position: one 16x16 column group in the world's horizontal
/// partitioning, spanning the full vertical extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionPos(pub Vector2<i32>);

impl BlockPos {
    /// Creates a block position from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The region containing this position.
    #[must_use]
    pub const fn region(&self) -> RegionPos {
        RegionPos(Vector2::new(self.0.x >> 4, self.0.z >> 4))
    }

    /// The center point of this block, as a continuous coordinate.
    #[must_use]
    pub fn center(&self) -> Vector3<f64> {
        Vector3::new(
            f64::from(self.0.x) + 0.5,
            f64::from(self.0.y) + 0.5,
            f64::from(self.0.z) + 0.5,
        )
    }
}

impl RegionPos {
    /// Creates a region position.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The region containing the given continuous point.
    #[must_use]
    pub fn containing(x: f64, z: f64) -> Self {
        Self(Vector2::new((x.floor() as i32) >> 4, (z.floor() as i32) >> 4))
    }

    /// Whether the given block position falls inside this region's bounds.
    #[must_use]
    pub const fn contains(&self, pos: &BlockPos) -> bool {
        (pos.0.x >> 4) == self.0.x && (pos.0.z >> 4) == self.0.z
    }
}
