//! Viewport transform handed to the shading stage alongside the program.
//!
//! The grid square spans `mantissa * 10^exponent` world units and covers
//! `footprint` pixels. Zooming walks the mantissa through the 1-2-5 series,
//! carrying into the exponent.

use serde::{Deserialize, Serialize};

/// Default pixels per grid square.
pub const DEFAULT_FOOTPRINT: u32 = 50;

/// Mantissas of the grid-square size, in increasing order.
const SERIES: [u8; 3] = [1, 2, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Pixel offset of the world origin from the canvas center.
    pub origin: (i32, i32),
    /// One of 1, 2 or 5.
    pub mantissa: u8,
    pub exponent: i32,
    /// Pixels per grid square.
    pub footprint: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            origin: (0, 0),
            mantissa: 1,
            exponent: 0,
            footprint: DEFAULT_FOOTPRINT,
        }
    }
}

impl Viewport {
    /// Returns true if the mantissa is in the 1-2-5 series and the footprint
    /// is positive.
    pub fn is_valid(&self) -> bool {
        SERIES.contains(&self.mantissa) && self.footprint > 0
    }

    /// World units covered by one grid square.
    pub fn square_size(&self) -> f64 {
        f64::from(self.mantissa) * 10f64.powi(self.exponent)
    }

    /// World units per pixel.
    pub fn unit(&self) -> f64 {
        self.square_size() / f64::from(self.footprint.max(1))
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.origin.0 = self.origin.0.saturating_add(dx);
        self.origin.1 = self.origin.1.saturating_add(dy);
    }

    /// Shows more detail: 5 -> 2 -> 1 -> 5e-1.
    pub fn zoom_in(&mut self) {
        match self.series_index() {
            0 => {
                self.mantissa = SERIES[2];
                self.exponent -= 1;
            }
            i => self.mantissa = SERIES[i - 1],
        }
    }

    /// Shows more area: 1 -> 2 -> 5 -> 1e1.
    pub fn zoom_out(&mut self) {
        match self.series_index() {
            2 => {
                self.mantissa = SERIES[0];
                self.exponent += 1;
            }
            i => self.mantissa = SERIES[i + 1],
        }
    }

    /// Returns to the default viewport.
    pub fn home(&mut self) {
        *self = Viewport::default();
    }

    fn series_index(&self) -> usize {
        SERIES
            .iter()
            .position(|m| *m == self.mantissa)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_walks_the_series() {
        let mut v = Viewport::default();
        let mut sizes = Vec::new();
        for _ in 0..4 {
            v.zoom_out();
            sizes.push((v.mantissa, v.exponent));
        }
        assert_eq!(sizes, vec![(2, 0), (5, 0), (1, 1), (2, 1)]);

        let mut v = Viewport::default();
        v.zoom_in();
        assert_eq!((v.mantissa, v.exponent), (5, -1));
        v.zoom_in();
        assert_eq!((v.mantissa, v.exponent), (2, -1));
    }

    #[test]
    fn zoom_round_trips() {
        let mut v = Viewport::default();
        v.zoom_in();
        v.zoom_in();
        v.zoom_out();
        v.zoom_out();
        assert_eq!(v, Viewport::default());
    }

    #[test]
    fn unit_and_home() {
        let mut v = Viewport::default();
        assert!((v.unit() - 0.02).abs() < 1e-12);
        v.pan(10, -4);
        v.zoom_out();
        assert_eq!(v.origin, (10, -4));
        v.home();
        assert_eq!(v, Viewport::default());
    }

    #[test]
    fn validity() {
        assert!(Viewport::default().is_valid());
        let v = Viewport {
            mantissa: 3,
            ..Viewport::default()
        };
        assert!(!v.is_valid());
    }
}
