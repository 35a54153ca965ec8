use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Series colours
// ---------------------------------------------------------------------------

/// The ten-colour cycle the homework charts were first drawn with, so
/// regenerated figures keep their familiar series colours.
const SERIES_CYCLE: [(u8, u8, u8); 10] = [
    (0x1f, 0x77, 0xb4),
    (0xff, 0x7f, 0x0e),
    (0x2c, 0xa0, 0x2c),
    (0xd6, 0x27, 0x28),
    (0x94, 0x67, 0xbd),
    (0x8c, 0x56, 0x4b),
    (0xe3, 0x77, 0xc2),
    (0x7f, 0x7f, 0x7f),
    (0xbc, 0xbd, 0x22),
    (0x17, 0xbe, 0xcf),
];

/// Golden-angle step between extra hues, in degrees.
const HUE_STEP: f32 = 137.508;

/// Colour for the `i`-th series: the fixed cycle first, then golden-angle
/// hues so any number of series stay distinguishable.
pub fn series_color(i: usize) -> RGBColor {
    let srgb: Srgb<u8> = match SERIES_CYCLE.get(i) {
        Some(&(r, g, b)) => Srgb::new(r, g, b),
        None => {
            let extra = (i - SERIES_CYCLE.len()) as f32;
            let hsl = Hsl::new((extra * HUE_STEP) % 360.0, 0.65, 0.45);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        }
    };
    let (r, g, b) = srgb.into_components();
    RGBColor(r, g, b)
}

/// Colours for `n` series, in series order.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    (0..n).map(series_color).collect()
}

// ---------------------------------------------------------------------------
// Color mapping: series label → RGBColor
// ---------------------------------------------------------------------------

/// Maps series labels to distinct colours, in the order they were given.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, RGBColor>,
    default_color: RGBColor,
}

impl ColorMap {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        let palette = generate_palette(labels.len());
        let mapping = labels
            .iter()
            .zip(palette)
            .map(|(label, c)| (label.as_ref().to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: RGBColor(128, 128, 128),
        }
    }

    /// Look up the colour for a label; unknown labels are grey.
    pub fn color_for(&self, label: &str) -> RGBColor {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_colors_are_distinct() {
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_first_series_use_the_fixed_cycle() {
        assert_eq!(series_color(0), RGBColor(0x1f, 0x77, 0xb4));
        assert_eq!(series_color(3), RGBColor(0xd6, 0x27, 0x28));
    }

    #[test]
    fn test_many_series_stay_distinct() {
        let colors = generate_palette(16);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_unknown_label_is_grey() {
        let map = ColorMap::new(&["static", "dynamic"]);
        assert_ne!(map.color_for("static"), map.color_for("dynamic"));
        assert_eq!(map.color_for("guided"), RGBColor(128, 128, 128));
    }
}
