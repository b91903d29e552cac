use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGB color used for chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs the color as the host expects it: blue in the top byte, then green,
    /// then red, low byte unused.
    #[inline]
    pub const fn to_packed_bgr(self) -> i32 {
        ((self.b as i32) << 24) | ((self.g as i32) << 16) | ((self.r as i32) << 8)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(r: {}, g: {}, b: {})", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_blue_green_red() {
        assert_eq!(Color::new(0x11, 0x22, 0x33).to_packed_bgr() as u32, 0x3322_1100);
        assert_eq!(Color::RED.to_packed_bgr() as u32, 0x0000_FF00);
        assert_eq!(Color::BLUE.to_packed_bgr() as u32, 0xFF00_0000);
        assert_eq!(Color::WHITE.to_packed_bgr() as u32, 0xFFFF_FF00);
        assert_eq!(Color::BLACK.to_packed_bgr(), 0);
    }
}
