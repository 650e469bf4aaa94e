//! Sub-pixel sampling.
//!
//! Both samplers take a pixel fetch closure so callers can plug in their own
//! row lookup. Coordinates are clamped to the image.

use super::color::{alpha, blue, color_mix_25, color_mix_50, color_mix_75, green, red, rgba};

/// Bilinear sample using an 8-step mixing table.
///
/// The fractional offset is quantised to eighths and the neighbours are mixed
/// with shift-only averages. At the right or bottom edge the interpolation
/// falls back to one axis, and at the bottom-right corner to the pixel itself.
pub fn bilinear_fast<F>(width: u32, height: u32, x: f64, y: f64, pixel: F) -> u32
where
    F: Fn(u32, u32) -> u32,
{
    let (ix, iy, x, y) = clamp(width, height, x, y);
    let top_left = pixel(ix, iy);

    if iy + 1 < height {
        let f_y = 8.0 * (y - f64::from(iy));
        let bottom_left = pixel(ix, iy + 1);
        let left = mix_eighths(top_left, bottom_left, f_y);

        if ix + 1 < width {
            let f_x = 8.0 * (x - f64::from(ix));
            let top_right = pixel(ix + 1, iy);
            let bottom_right = pixel(ix + 1, iy + 1);
            let right = mix_eighths(top_right, bottom_right, f_y);
            mix_eighths(left, right, f_x)
        } else {
            left
        }
    } else if ix + 1 < width {
        let f_x = 8.0 * (x - f64::from(ix));
        if f_x == 0.0 {
            return top_left;
        }
        mix_eighths(top_left, pixel(ix + 1, iy), f_x)
    } else {
        top_left
    }
}

/// Floating-point bilinear sample, per channel including alpha.
///
/// Channel values are truncated. At integer coordinates the result equals the
/// pixel at that position.
pub fn bilinear_exact<F>(width: u32, height: u32, x: f64, y: f64, pixel: F) -> u32
where
    F: Fn(u32, u32) -> u32,
{
    let (ix, iy, x, y) = clamp(width, height, x, y);
    let top_left = pixel(ix, iy);
    let f_x = x - f64::from(ix);
    let f_y = y - f64::from(iy);

    let left = if iy + 1 < height {
        lerp(top_left, pixel(ix, iy + 1), f_y)
    } else {
        Channels::from(top_left)
    };

    if ix + 1 < width {
        let right = if iy + 1 < height {
            lerp(pixel(ix + 1, iy), pixel(ix + 1, iy + 1), f_y)
        } else {
            Channels::from(pixel(ix + 1, iy))
        };
        left.lerp(&right, f_x).pack()
    } else {
        left.pack()
    }
}

fn clamp(width: u32, height: u32, x: f64, y: f64) -> (u32, u32, f64, f64) {
    let max_x = f64::from(width.saturating_sub(1));
    let max_y = f64::from(height.saturating_sub(1));
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, max_x) };
    let y = if y.is_nan() { 0.0 } else { y.clamp(0.0, max_y) };
    (x as u32, y as u32, x, y)
}

fn mix_eighths(first: u32, second: u32, eighths: f64) -> u32 {
    if eighths < 1.0 {
        first
    } else if eighths < 3.0 {
        color_mix_75(first, second)
    } else if eighths < 5.0 {
        color_mix_50(first, second)
    } else if eighths < 7.0 {
        color_mix_25(first, second)
    } else {
        second
    }
}

#[derive(Debug, Clone, Copy)]
struct Channels([f64; 4]);

impl From<u32> for Channels {
    fn from(c: u32) -> Self {
        Channels([
            f64::from(alpha(c)),
            f64::from(red(c)),
            f64::from(green(c)),
            f64::from(blue(c)),
        ])
    }
}

impl Channels {
    fn lerp(&self, other: &Channels, f: f64) -> Channels {
        let mut out = [0.0; 4];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.0[i] + (other.0[i] - self.0[i]) * f;
        }
        Channels(out)
    }

    fn pack(&self) -> u32 {
        let c = |v: f64| v.clamp(0.0, 255.0) as u8;
        rgba(c(self.0[1]), c(self.0[2]), c(self.0[3]), c(self.0[0]))
    }
}

fn lerp(a: u32, b: u32, f: f64) -> Channels {
    Channels::from(a).lerp(&Channels::from(b), f)
}
