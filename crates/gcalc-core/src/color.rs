//! Host color representation for equation rows.
//!
//! Rows are colored in HSL, the way the sidebar styles them. The GPU side
//! wants normalized RGB, so [`HslColor::to_rgb8`] performs the same rounding a
//! CSS color parser would before the encoder divides by 255.

use serde::{Deserialize, Serialize};

/// Degrees the hue advances for every new row.
pub const HUE_STEP: u16 = 49;
/// Saturation (percent) shared by every palette color.
pub const PALETTE_SATURATION: u8 = 69;
/// Lightness (percent) shared by every palette color.
pub const PALETTE_LIGHTNESS: u8 = 69;

/// An HSL color with hue in degrees and saturation/lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HslColor {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HslColor {
    pub fn new(hue: u16, saturation: u8, lightness: u8) -> Self {
        HslColor {
            hue: hue % 360,
            saturation: saturation.min(100),
            lightness: lightness.min(100),
        }
    }

    /// The palette color at the given hue.
    pub fn palette(hue: u16) -> Self {
        HslColor::new(hue, PALETTE_SATURATION, PALETTE_LIGHTNESS)
    }

    /// The palette color assigned to the row created after this one.
    pub fn next_in_palette(self) -> Self {
        HslColor::palette((self.hue + HUE_STEP) % 360)
    }

    /// Converts to 8-bit RGB, rounding each channel to the nearest integer.
    pub fn to_rgb8(self) -> Rgb8 {
        let s = f64::from(self.saturation) / 100.0;
        let l = f64::from(self.lightness) / 100.0;
        let h = f64::from(self.hue % 360) / 60.0;

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let m = l - chroma / 2.0;

        let (r, g, b) = match h as u8 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb8 {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }

    /// CSS form used by the presentation layer, e.g. `hsl(49 69% 69%)`.
    pub fn css(&self) -> String {
        format!("hsl({} {}% {}%)", self.hue, self.saturation, self.lightness)
    }
}

impl Default for HslColor {
    fn default() -> Self {
        HslColor::palette(0)
    }
}

impl Rgb8 {
    /// Channels scaled into `0.0..=1.0`.
    pub fn normalized(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}
