//! Blend modes that do not follow the per-channel formula pattern.

use crate::raster::color::{alpha, blue, gray, green, red, rgb, source_over, unpremultiply};
use crate::raster::Raster;
use crate::sun::{max_divisor, SunShading, MAX_INTERPOLATION_STEP};

use super::BlendContext;

/// Calls `f(bottom_pixel, top_pixel)` over the overlapping area, with the top
/// pixel in straight ARGB.
fn for_each_pixel<F>(bottom: &mut Raster, top: &Raster, mut f: F)
where
    F: FnMut(&mut u32, u32),
{
    let top = top.to_straight();
    let width = bottom.width().min(top.width()) as usize;
    let height = bottom.height().min(top.height());

    for y in 0..height {
        let (Some(bottom_row), Some(top_row)) = (bottom.row_mut(y), top.row(y)) else {
            continue;
        };
        for (b, &t) in bottom_row[..width].iter_mut().zip(&top_row[..width]) {
            f(b, t);
        }
    }
}

/// Source-over: `alpha·top + (1 − alpha)·bottom`, rounded once per channel.
pub(super) fn overpaint(bottom: &mut Raster, top: &Raster) {
    for_each_pixel(bottom, top, |b, t| *b = source_over(*b, t));
}

/// Whitens the bottom by the cloud density in the top red channel.
pub(super) fn clouds(bottom: &mut Raster, top: &Raster) {
    for_each_pixel(bottom, top, |b, t| {
        let c = f64::from(red(t)) / 255.0;
        let base = unpremultiply(*b);
        let lift = |v: u8| (f64::from(v) + (255.0 - f64::from(v)) * c) as u8;
        *b = rgb(lift(red(base)), lift(green(base)), lift(blue(base)));
    });
}

/// Paints the top red intensity over the bottom, weighted by top alpha.
pub(super) fn alpha_intensity(bottom: &mut Raster, top: &Raster) {
    for_each_pixel(bottom, top, |b, t| {
        let c = f64::from(red(t));
        let a = f64::from(alpha(t)) / 255.0;
        let base = unpremultiply(*b);
        let mix = |v: u8| (c * a + (1.0 - a) * f64::from(v)) as u8;
        *b = rgb(mix(red(base)), mix(green(base)), mix(blue(base)));
    });
}

/// Replaces the bottom with the grey level of the top.
pub(super) fn grayscale(bottom: &mut Raster, top: &Raster) {
    for_each_pixel(bottom, top, |b, t| {
        let g = gray(t);
        *b = rgb(g, g, g);
    });
}

/// Day/night composite: the bottom is the day image, the top the night image.
pub(super) fn sun_light(bottom: &mut Raster, top: &Raster, ctx: &BlendContext) {
    let top = top.to_straight();
    let tile_width = bottom.width();
    let tile_height = bottom.height();
    let width = tile_width.min(top.width());
    let height = tile_height.min(top.height());

    let global_width = f64::from(tile_width) * f64::from(ctx.geometry.columns_at(ctx.tile.level));
    let global_height = f64::from(tile_height) * f64::from(ctx.geometry.rows_at(ctx.tile.level));
    if global_width == 0.0 || global_height == 0.0 {
        return;
    }

    let step = max_divisor(MAX_INTERPOLATION_STEP, width);
    let origin_x = f64::from(ctx.tile.column) * f64::from(tile_width);
    let origin_y = f64::from(ctx.tile.row) * f64::from(tile_height);
    let lon_at = |x: u32| ctx.projection.lon_at((origin_x + f64::from(x)) / global_width);

    for y in 0..height {
        let lat = ctx
            .projection
            .row_to_lat(origin_y + f64::from(y), global_height);
        let terms = ctx.sun.row_terms(lat);
        let (Some(day), Some(night)) = (bottom.row_mut(y), top.row(y)) else {
            continue;
        };
        ctx.sun.shade_scanline(width, step, terms, lon_at, |x, shade| {
            SunShading::shade_pixel_composite(&mut day[x], night[x], shade);
        });
    }
}
