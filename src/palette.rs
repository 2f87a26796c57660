//! Display colours for breeds.

use crate::dominance::Breed;

const MAX_HUE: f32 = 360.0;
const SATURATION: f32 = 1.0;
const BRIGHTNESS: f32 = 0.9;

/// Glyphs used for text frames, one per breed (cycled when exhausted)
const GLYPHS: &[u8] = b"#o+x*=%@&~";

/// RGB colour
pub type Rgb = (u8, u8, u8);

/// One colour per breed, with hues evenly spaced around the colour wheel.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(num_breeds: u8) -> Self {
        let n = num_breeds.max(1) as f32;
        let colors = (0..num_breeds)
            .map(|i| hsb_to_rgb(i as f32 * MAX_HUE / n, SATURATION, BRIGHTNESS))
            .collect();
        Self { colors }
    }

    /// Colour of a breed. Out-of-range breeds render black.
    #[inline]
    pub fn color(&self, breed: Breed) -> Rgb {
        self.colors.get(breed as usize).copied().unwrap_or((0, 0, 0))
    }

    #[inline]
    pub fn glyph(&self, breed: Breed) -> char {
        GLYPHS[breed as usize % GLYPHS.len()] as char
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Convert hue (degrees), saturation and brightness in `[0, 1]` to RGB.
pub fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> Rgb {
    let h = hue.rem_euclid(MAX_HUE) / 60.0;
    let c = brightness * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = brightness - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(hsb_to_rgb(0.0, 1.0, 1.0), (255, 0, 0));
        assert_eq!(hsb_to_rgb(120.0, 1.0, 1.0), (0, 255, 0));
        assert_eq!(hsb_to_rgb(240.0, 1.0, 1.0), (0, 0, 255));
        assert_eq!(hsb_to_rgb(360.0, 1.0, 1.0), (255, 0, 0));
        assert_eq!(hsb_to_rgb(0.0, 0.0, 1.0), (255, 255, 255));
    }

    #[test]
    fn test_palette_evenly_spaced() {
        let palette = Palette::new(3);
        assert_eq!(palette.len(), 3);
        let (r, g, b) = palette.color(0);
        assert!(r > 220 && g == 0 && b == 0);
        let (r, g, b) = palette.color(1);
        assert!(r == 0 && g > 220 && b == 0);
        let (r, g, b) = palette.color(2);
        assert!(r == 0 && g == 0 && b > 220);
        assert_eq!(palette.color(9), (0, 0, 0));
    }

    #[test]
    fn test_colors_distinct() {
        let palette = Palette::new(12);
        for (i, a) in palette.colors().iter().enumerate() {
            for b in &palette.colors()[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_glyphs() {
        let palette = Palette::new(3);
        assert_eq!(palette.glyph(0), '#');
        assert_ne!(palette.glyph(0), palette.glyph(1));
    }
}
