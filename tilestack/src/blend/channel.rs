//! Independent-channel blend modes.
//!
//! Each mode combines one colour channel of the bottom and top images,
//! both as intensities in `[0, 1]`. Results are clamped before they are
//! written back.

use rayon::prelude::*;

use crate::raster::color::{blue, green, red, rgb, unpremultiply};
use crate::raster::Raster;

/// Per-channel blend formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelBlend {
    // neutral
    Allanon,
    ArcusTangent,
    GeometricMean,
    LinearLight,
    Overlay,
    Parallel,
    Texture,
    // darkening
    ColorBurn,
    Dark,
    Darken,
    Divide,
    GammaDark,
    LinearBurn,
    Multiply,
    Subtractive,
    // lightening
    Additive,
    ColorDodge,
    GammaLight,
    HardLight,
    Light,
    Lighten,
    PinLight,
    Screen,
    SoftLight,
    VividLight,
    // inverter
    AdditiveSubtractive,
    Bleach,
    Difference,
    Equivalence,
    HalfDifference,
}

impl ChannelBlend {
    pub const ALL: [ChannelBlend; 30] = [
        ChannelBlend::Allanon,
        ChannelBlend::ArcusTangent,
        ChannelBlend::GeometricMean,
        ChannelBlend::LinearLight,
        ChannelBlend::Overlay,
        ChannelBlend::Parallel,
        ChannelBlend::Texture,
        ChannelBlend::ColorBurn,
        ChannelBlend::Dark,
        ChannelBlend::Darken,
        ChannelBlend::Divide,
        ChannelBlend::GammaDark,
        ChannelBlend::LinearBurn,
        ChannelBlend::Multiply,
        ChannelBlend::Subtractive,
        ChannelBlend::Additive,
        ChannelBlend::ColorDodge,
        ChannelBlend::GammaLight,
        ChannelBlend::HardLight,
        ChannelBlend::Light,
        ChannelBlend::Lighten,
        ChannelBlend::PinLight,
        ChannelBlend::Screen,
        ChannelBlend::SoftLight,
        ChannelBlend::VividLight,
        ChannelBlend::AdditiveSubtractive,
        ChannelBlend::Bleach,
        ChannelBlend::Difference,
        ChannelBlend::Equivalence,
        ChannelBlend::HalfDifference,
    ];

    /// Theme-file name, e.g. `MultiplyBlending`.
    pub fn name(&self) -> &'static str {
        match self {
            ChannelBlend::Allanon => "AllanonBlending",
            ChannelBlend::ArcusTangent => "ArcusTangentBlending",
            ChannelBlend::GeometricMean => "GeometricMeanBlending",
            ChannelBlend::LinearLight => "LinearLightBlending",
            ChannelBlend::Overlay => "OverlayBlending",
            ChannelBlend::Parallel => "ParallelBlending",
            ChannelBlend::Texture => "TextureBlending",
            ChannelBlend::ColorBurn => "ColorBurnBlending",
            ChannelBlend::Dark => "DarkBlending",
            ChannelBlend::Darken => "DarkenBlending",
            ChannelBlend::Divide => "DivideBlending",
            ChannelBlend::GammaDark => "GammaDarkBlending",
            ChannelBlend::LinearBurn => "LinearBurnBlending",
            ChannelBlend::Multiply => "MultiplyBlending",
            ChannelBlend::Subtractive => "SubtractiveBlending",
            ChannelBlend::Additive => "AdditiveBlending",
            ChannelBlend::ColorDodge => "ColorDodgeBlending",
            ChannelBlend::GammaLight => "GammaLightBlending",
            ChannelBlend::HardLight => "HardLightBlending",
            ChannelBlend::Light => "LightBlending",
            ChannelBlend::Lighten => "LightenBlending",
            ChannelBlend::PinLight => "PinLightBlending",
            ChannelBlend::Screen => "ScreenBlending",
            ChannelBlend::SoftLight => "SoftLightBlending",
            ChannelBlend::VividLight => "VividLightBlending",
            ChannelBlend::AdditiveSubtractive => "AdditiveSubtractiveBlending",
            ChannelBlend::Bleach => "BleachBlending",
            ChannelBlend::Difference => "DifferenceBlending",
            ChannelBlend::Equivalence => "EquivalenceBlending",
            ChannelBlend::HalfDifference => "HalfDifferenceBlending",
        }
    }

    /// Blends one channel. Inputs and output are intensities in `[0, 1]`;
    /// the output may fall outside that range or be NaN for degenerate inputs.
    pub fn apply(&self, b: f64, t: f64) -> f64 {
        match self {
            ChannelBlend::Allanon => (b + t) / 2.0,
            ChannelBlend::ArcusTangent => 2.0 * (t / b).atan() / std::f64::consts::PI,
            ChannelBlend::GeometricMean => (b * t).sqrt(),
            ChannelBlend::LinearLight => b + 2.0 * t - 1.0,
            ChannelBlend::Overlay => {
                if b < 0.5 {
                    2.0 * b * t
                } else {
                    1.0 - 2.0 * (1.0 - b) * (1.0 - t)
                }
            }
            ChannelBlend::Parallel => 2.0 / (1.0 / b + 1.0 / t),
            ChannelBlend::Texture => t + b - 0.5,
            ChannelBlend::ColorBurn => 1.0 - (1.0 - b) / t,
            ChannelBlend::Dark => (b + 1.0 - t) * t,
            ChannelBlend::Darken => b.min(t),
            ChannelBlend::Divide => (1.0 + b / (1.0 - t) / 8.0).log2(),
            ChannelBlend::GammaDark => b.powf(1.0 / t),
            ChannelBlend::LinearBurn => (b + t - 1.0).max(0.0),
            ChannelBlend::Multiply => b * t,
            ChannelBlend::Subtractive => (b - t).max(0.0),
            ChannelBlend::Additive => (b + t).min(1.0),
            ChannelBlend::ColorDodge => b / (1.0 - t),
            ChannelBlend::GammaLight => b.powf(t),
            ChannelBlend::HardLight => {
                if t < 0.5 {
                    2.0 * b * t
                } else {
                    1.0 - 2.0 * (1.0 - b) * (1.0 - t)
                }
            }
            ChannelBlend::Light => b * (1.0 - t) + t * t,
            ChannelBlend::Lighten => b.max(t),
            ChannelBlend::PinLight => (2.0 * t - 1.0).max(b.min(2.0 * t)),
            ChannelBlend::Screen | ChannelBlend::Bleach => 1.0 - (1.0 - b) * (1.0 - t),
            ChannelBlend::SoftLight => b.powf(2f64.powf(2.0 * (0.5 - t))),
            ChannelBlend::VividLight => {
                if t < 0.5 {
                    (1.0 - (1.0 - b) / (2.0 * t)).clamp(0.0, 1.0)
                } else {
                    (b / (2.0 * (1.0 - t))).clamp(0.0, 1.0)
                }
            }
            ChannelBlend::AdditiveSubtractive => (b * b - t * t).abs(),
            ChannelBlend::Difference => b - t + 0.5,
            ChannelBlend::Equivalence => 1.0 - (b - t).abs(),
            ChannelBlend::HalfDifference => b + t - 2.0 * b * t,
        }
    }

    /// Blends `top` onto the premultiplied `bottom`, writing opaque pixels.
    ///
    /// Rows are processed in parallel; every row only touches its own pixels.
    pub(crate) fn blend(&self, bottom: &mut Raster, top: &Raster) {
        let top = top.to_straight();
        let width = bottom.width().min(top.width()) as usize;
        let height = bottom.height().min(top.height()) as usize;
        let stride = bottom.stride();
        let top_stride = top.stride();
        let Some(top_words) = top.words() else {
            return;
        };
        let Some(bottom_words) = bottom.words_mut() else {
            return;
        };

        bottom_words
            .par_chunks_mut(stride.max(1))
            .take(height)
            .enumerate()
            .for_each(|(y, row)| {
                let top_row = &top_words[y * top_stride..y * top_stride + width];
                for (pixel, &t) in row[..width].iter_mut().zip(top_row) {
                    let b = unpremultiply(*pixel);
                    *pixel = rgb(
                        self.channel(red(b), red(t)),
                        self.channel(green(b), green(t)),
                        self.channel(blue(b), blue(t)),
                    );
                }
            });
    }

    fn channel(&self, bottom: u8, top: u8) -> u8 {
        let v = self.apply(f64::from(bottom) / 255.0, f64::from(top) / 255.0);
        // NaN saturates to 0
        (v.clamp(0.0, 1.0) * 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PixelFormat;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_formulas_at_reference_points() {
        assert!((ChannelBlend::Multiply.apply(0.5, 0.5) - 0.25).abs() < EPS);
        assert!((ChannelBlend::Screen.apply(0.5, 0.5) - 0.75).abs() < EPS);
        assert!((ChannelBlend::Allanon.apply(0.2, 0.6) - 0.4).abs() < EPS);
        assert!((ChannelBlend::Darken.apply(0.2, 0.6) - 0.2).abs() < EPS);
        assert!((ChannelBlend::Lighten.apply(0.2, 0.6) - 0.6).abs() < EPS);
        assert!((ChannelBlend::Difference.apply(0.5, 0.5) - 0.5).abs() < EPS);
        assert!((ChannelBlend::Equivalence.apply(0.3, 0.3) - 1.0).abs() < EPS);
        assert!((ChannelBlend::HalfDifference.apply(1.0, 1.0)).abs() < EPS);
        assert!((ChannelBlend::Overlay.apply(0.25, 0.5) - 0.25).abs() < EPS);
        assert!((ChannelBlend::HardLight.apply(0.5, 0.25) - 0.25).abs() < EPS);
        assert!((ChannelBlend::GeometricMean.apply(0.25, 1.0) - 0.5).abs() < EPS);
        assert!((ChannelBlend::SoftLight.apply(0.25, 0.5) - 0.25).abs() < EPS);
        assert!((ChannelBlend::PinLight.apply(0.8, 0.25) - 0.5).abs() < EPS);
        assert!((ChannelBlend::Parallel.apply(0.5, 0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_every_mode_is_clamped_and_finite() {
        let samples = [0.0, 0.25, 0.5, 1.0];
        for mode in ChannelBlend::ALL {
            for b in samples {
                for t in samples {
                    let bottom = (b * 255.0) as u8;
                    let top = (t * 255.0) as u8;
                    // must not panic, whatever the formula yields
                    let _ = mode.channel(bottom, top);
                }
            }
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = ChannelBlend::ALL.iter().map(|m| m.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ChannelBlend::ALL.len());
    }

    #[test]
    fn test_blend_multiply_raster() {
        let mut bottom = Raster::filled(3, 2, PixelFormat::Argb32Premultiplied, rgb(255, 128, 0));
        let top = Raster::filled(3, 2, PixelFormat::Argb32, rgb(128, 255, 255));

        ChannelBlend::Multiply.blend(&mut bottom, &top);

        let p = bottom.pixel(2, 1);
        assert!((i32::from(red(p)) - 128).abs() <= 1);
        assert!((i32::from(green(p)) - 128).abs() <= 1);
        assert_eq!(blue(p), 0);
    }

    #[test]
    fn test_blend_matches_serial_evaluation() {
        let words: Vec<u32> = (0..64u32)
            .map(|i| rgb((i * 4) as u8, (255 - i * 3) as u8, (i * 7 % 256) as u8))
            .collect();
        let top = Raster::from_words(8, 8, PixelFormat::Argb32, words.clone()).unwrap();
        let mut bottom = Raster::filled(8, 8, PixelFormat::Argb32Premultiplied, rgb(90, 160, 220));

        ChannelBlend::Overlay.blend(&mut bottom, &top);

        for (i, &t) in words.iter().enumerate() {
            let x = (i % 8) as u32;
            let y = (i / 8) as u32;
            let expected = rgb(
                ChannelBlend::Overlay.channel(90, red(t)),
                ChannelBlend::Overlay.channel(160, green(t)),
                ChannelBlend::Overlay.channel(220, blue(t)),
            );
            assert_eq!(bottom.pixel(x, y), expected);
        }
    }
}
