//! Colour domain computation and the sequential colour scale.

use palette::{FromColor, Hsl, Srgb};
use serde::Serialize;

/// Fill for regions without a usable value.
pub const NEUTRAL_FILL: Srgb<u8> = Srgb::new(0xee, 0xee, 0xee);

/// Nine-class sequential blues, light to dark.
const BLUES: [Srgb<u8>; 9] = [
    Srgb::new(0xf7, 0xfb, 0xff),
    Srgb::new(0xde, 0xeb, 0xf7),
    Srgb::new(0xc6, 0xdb, 0xef),
    Srgb::new(0x9e, 0xca, 0xe1),
    Srgb::new(0x6b, 0xae, 0xd6),
    Srgb::new(0x42, 0x92, 0xc6),
    Srgb::new(0x21, 0x71, 0xb5),
    Srgb::new(0x08, 0x51, 0x9c),
    Srgb::new(0x08, 0x30, 0x6b),
];

/// The `[min, max]` range mapped onto the colour scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDomain {
    pub min: f64,
    pub max: f64,
}

impl ColorDomain {
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    /// Extent of the year's rates, falling back to the dataset-wide extent
    /// and then to `[0, 1]`. A degenerate result is widened to one unit
    /// starting at `max(0, min)`.
    pub fn compute<I, J>(year_rates: I, all_rates: J) -> Self
    where
        I: IntoIterator<Item = f64>,
        J: IntoIterator<Item = f64>,
    {
        let (mut min, mut max) = extent(year_rates)
            .or_else(|| extent(all_rates))
            .unwrap_or((0.0, 1.0));

        if !min.is_finite() || !max.is_finite() || min == max {
            min = if min.is_finite() { min.max(0.0) } else { 0.0 };
            max = min + 1.0;
        }

        Self { min, max }
    }

    /// Position of `value` in the domain, clamped to `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn lerp(&self, t: f64) -> f64 {
        self.min + t * (self.max - self.min)
    }

    /// Linear map into `[0, width]`, as used by the legend axis.
    pub fn to_axis(&self, value: f64, width: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        (value - self.min) / span * width
    }
}

fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

pub trait ColorScale {
    fn domain(&self) -> ColorDomain;
    fn color(&self, value: f64) -> Srgb<u8>;
}

#[derive(Debug, Clone, Copy)]
pub struct SequentialBlues {
    domain: ColorDomain,
}

impl SequentialBlues {
    pub fn new(domain: ColorDomain) -> Self {
        Self { domain }
    }
}

impl ColorScale for SequentialBlues {
    fn domain(&self) -> ColorDomain {
        self.domain
    }

    fn color(&self, value: f64) -> Srgb<u8> {
        let scaled = self.domain.normalize(value) * (BLUES.len() - 1) as f64;
        let i = (scaled.floor() as usize).min(BLUES.len() - 2);
        let t = (scaled - i as f64) as f32;
        let a: Srgb<f32> = BLUES[i].into_format();
        let b: Srgb<f32> = BLUES[i + 1].into_format();
        Srgb::new(
            a.red + (b.red - a.red) * t,
            a.green + (b.green - a.green) * t,
            a.blue + (b.blue - a.blue) * t,
        )
        .into_format()
    }
}

/// Scales HSL lightness by `0.7^k`.
pub fn darker(color: Srgb<u8>, k: f64) -> Srgb<u8> {
    let mut hsl: Hsl = Hsl::from_color(color.into_format::<f32>());
    hsl.lightness *= 0.7_f32.powf(k as f32);
    let rgb: Srgb<f32> = Srgb::from_color(hsl);
    rgb.into_format()
}

pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Perceived brightness, for comparing fills.
pub fn luminance(color: Srgb<u8>) -> f64 {
    0.2126 * color.red as f64 + 0.7152 * color.green as f64 + 0.0722 * color.blue as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_uses_year_extent() {
        let domain = ColorDomain::compute([120.0, 80.0, 95.0], [1.0, 500.0]);
        assert_eq!(domain, ColorDomain { min: 80.0, max: 120.0 });
    }

    #[test]
    fn domain_falls_back_to_dataset_extent() {
        let domain = ColorDomain::compute(std::iter::empty(), [3.0, 9.0, 4.0]);
        assert_eq!(domain, ColorDomain { min: 3.0, max: 9.0 });
    }

    #[test]
    fn domain_without_values_is_unit() {
        let domain = ColorDomain::compute(std::iter::empty(), std::iter::empty());
        assert_eq!(domain, ColorDomain::UNIT);
    }

    #[test]
    fn degenerate_domain_is_widened() {
        assert_eq!(
            ColorDomain::compute([42.0, 42.0], std::iter::empty()),
            ColorDomain { min: 42.0, max: 43.0 }
        );
        assert_eq!(
            ColorDomain::compute([-5.0], std::iter::empty()),
            ColorDomain { min: 0.0, max: 1.0 }
        );
    }

    #[test]
    fn axis_and_lerp_agree() {
        let domain = ColorDomain { min: 80.0, max: 120.0 };
        assert_eq!(domain.lerp(0.5), 100.0);
        assert_eq!(domain.to_axis(100.0, 120.0), 60.0);
        assert_eq!(domain.normalize(200.0), 1.0);
        assert_eq!(domain.normalize(0.0), 0.0);
    }

    #[test]
    fn scale_endpoints_match_ramp() {
        let scale = SequentialBlues::new(ColorDomain { min: 80.0, max: 120.0 });
        assert_eq!(to_hex(scale.color(80.0)), "#f7fbff");
        assert_eq!(to_hex(scale.color(120.0)), "#08306b");
        assert!(luminance(scale.color(120.0)) < luminance(scale.color(100.0)));
        assert!(luminance(scale.color(100.0)) < luminance(scale.color(80.0)));
    }

    #[test]
    fn darker_reduces_lightness() {
        let base = Srgb::new(0x6b, 0xae, 0xd6);
        assert!(luminance(darker(base, 0.35)) < luminance(base));
        assert!(luminance(darker(base, 0.7)) < luminance(darker(base, 0.35)));
    }
}
