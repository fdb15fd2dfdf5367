//! RGB color with the lenient parsing used by particle configuration.

use serde::{Deserialize, Serialize};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
}

impl Rgb {
    /// Opaque white, the fallback for unparseable color specs.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a color from its components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB`, `RRGGBB` or `r,g,b` (decimal components clamped to
    /// 0..=255). Returns `None` for anything else; callers decide the
    /// fallback.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let rgb = u32::from_str_radix(hex, 16).ok()?;
            return Some(Self::new(
                ((rgb >> 16) & 0xFF) as u8,
                ((rgb >> 8) & 0xFF) as u8,
                (rgb & 0xFF) as u8,
            ));
        }

        let parts: Vec<&str> = trimmed.split(',').collect();
        if parts.len() == 3 {
            let mut components = [0u8; 3];
            for (slot, part) in components.iter_mut().zip(&parts) {
                let value: i64 = part.trim().parse().ok()?;
                *slot = value.clamp(0, 255) as u8;
            }
            return Some(Self::new(components[0], components[1], components[2]));
        }

        None
    }
}
