//! Debug overlay identifying a tile: a border plus level, position and theme.

use tiny_skia::{Color, FillRule, LineJoin, Paint, PathBuilder, PixmapMut, Rect, Shader, Stroke, Transform};

use crate::coord::TileId;
use crate::raster::color::{alpha, blue, green, red, rgba};
use crate::raster::Raster;

/// Width of the border stroke in pixels.
const BORDER_WIDTH: f32 = 10.0;

/// Glyph cell of the built-in font, in font pixels.
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = 6;

/// Screen pixels per font pixel.
const GLYPH_SCALE: f32 = 2.0;

const OUTLINE_WIDTH: f32 = 2.0;

/// Paints the tile-id overlay onto a premultiplied 32-bit tile image.
///
/// Colours alternate in a checkerboard so neighbouring tiles are easy to
/// tell apart. Images in other formats are left untouched.
pub(super) fn paint_tile_id(image: &mut Raster, id: &TileId, theme_id: &str) {
    let width = image.width();
    let height = image.height();
    let Some(words) = image.words_mut() else {
        return;
    };

    let mut bytes: Vec<u8> = words
        .iter()
        .flat_map(|&p| [red(p), green(p), blue(p), alpha(p)])
        .collect();
    let Some(mut pixmap) = PixmapMut::from_bytes(&mut bytes, width, height) else {
        return;
    };

    let (foreground, background) = if id.column % 2 == id.row % 2 {
        (Color::WHITE, Color::BLACK)
    } else {
        (Color::BLACK, Color::WHITE)
    };
    let fg_paint = solid(foreground);
    let bg_paint = solid(background);

    let half = BORDER_WIDTH / 2.0;
    if let Some(rect) = Rect::from_xywh(
        half,
        half,
        width as f32 - BORDER_WIDTH,
        height as f32 - BORDER_WIDTH,
    ) {
        let border = PathBuilder::from_rect(rect);
        pixmap.stroke_path(
            &border,
            &fg_paint,
            &Stroke {
                width: BORDER_WIDTH,
                line_join: LineJoin::Miter,
                ..Default::default()
            },
            Transform::identity(),
            None,
        );
    }

    let position = format!("{:06}_{:06}", id.column, id.row);
    let left = (width as f32 - text_width(&position)) / 2.0;
    let lines = [
        (format!("level: {}", id.level), 0.25),
        (position, 0.50),
        (theme_id.to_string(), 0.75),
    ];

    let mut builder = PathBuilder::new();
    for (text, fraction) in &lines {
        let baseline = height as f32 * fraction;
        push_text(&mut builder, text, left, baseline);
    }
    if let Some(path) = builder.finish() {
        pixmap.stroke_path(
            &path,
            &fg_paint,
            &Stroke {
                width: OUTLINE_WIDTH,
                ..Default::default()
            },
            Transform::identity(),
            None,
        );
        pixmap.fill_path(&path, &bg_paint, FillRule::Winding, Transform::identity(), None);
    }

    for (word, px) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = rgba(px[0], px[1], px[2], px[3]);
    }
}

fn solid(color: Color) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(color),
        anti_alias: false,
        ..Default::default()
    }
}

fn text_width(text: &str) -> f32 {
    let chars = text.chars().count() as u32;
    (chars * GLYPH_ADVANCE).saturating_sub(GLYPH_ADVANCE - GLYPH_WIDTH) as f32 * GLYPH_SCALE
}

/// Adds one square per lit font pixel, glyphs sitting on `baseline`.
fn push_text(builder: &mut PathBuilder, text: &str, left: f32, baseline: f32) {
    let top = baseline - GLYPH_HEIGHT as f32 * GLYPH_SCALE;
    for (index, ch) in text.chars().enumerate() {
        let origin_x = left + (index as u32 * GLYPH_ADVANCE) as f32 * GLYPH_SCALE;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - column)) == 0 {
                    continue;
                }
                let x = origin_x + column as f32 * GLYPH_SCALE;
                let y = top + row as f32 * GLYPH_SCALE;
                if let Some(rect) = Rect::from_xywh(x, y, GLYPH_SCALE, GLYPH_SCALE) {
                    builder.push_rect(rect);
                }
            }
        }
    }
}

/// 5×7 glyph rows, most significant of the five bits on the left.
///
/// Letters are drawn in upper case; unknown characters are blank.
fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        _ => [0x00; 7],
    }
}
