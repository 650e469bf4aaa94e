//! Composited tiles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::coord::TileId;
use crate::raster::color::rgb;
use crate::raster::{sample, PixelFormat, Raster};

use super::texture::TextureTile;

/// The composite of every texture layer for one cell.
///
/// The raster is immutable once built. Pixel reads go through a table of
/// per-row start offsets so the renderer can fetch scanline pixels without
/// recomputing row positions.
#[derive(Debug)]
pub struct StackedTile {
    id: TileId,
    image: Raster,
    tiles: Vec<Arc<TextureTile>>,
    row_offsets: Vec<usize>,
    byte_count: usize,
    used: AtomicBool,
}

impl StackedTile {
    /// Wraps a composited raster and the layer tiles it was built from.
    pub fn new(id: TileId, image: Raster, tiles: Vec<Arc<TextureTile>>) -> Self {
        let row_offsets = (0..image.height() as usize)
            .map(|y| y * image.stride())
            .collect();
        let byte_count = image.byte_count() + tiles.iter().map(|t| t.byte_count()).sum::<usize>();

        Self {
            id,
            image,
            tiles,
            row_offsets,
            byte_count,
            used: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> &TileId {
        &self.id
    }

    #[inline]
    pub fn image(&self) -> &Raster {
        &self.image
    }

    /// The layer tiles in blend order.
    #[inline]
    pub fn tiles(&self) -> &[Arc<TextureTile>] {
        &self.tiles
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.image.depth()
    }

    /// Memory held by the composite and its layer tiles.
    #[inline]
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    #[inline]
    pub fn used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_used(&self, used: bool) {
        self.used.store(used, Ordering::Release);
    }

    /// Colour at `(x, y)`.
    ///
    /// 32-bit composites return the stored value. Greyscale, indexed and mono
    /// composites resolve to opaque colours through their colour table.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the tile.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let row = self.row_offsets[y as usize];
        assert!(x < self.image.width(), "pixel ({x}, {y}) out of bounds");

        match self.image.format() {
            PixelFormat::Rgb32 | PixelFormat::Argb32 | PixelFormat::Argb32Premultiplied => {
                let value = self.image.words().map_or(0, |w| w[row + x as usize]);
                if self.image.format() == PixelFormat::Rgb32 {
                    value | 0xff00_0000
                } else {
                    value
                }
            }
            PixelFormat::Grayscale8 => {
                let v = self.image.bytes().map_or(0, |b| b[row + x as usize]);
                rgb(v, v, v)
            }
            PixelFormat::Indexed8 => {
                let index = self.image.bytes().map_or(0, |b| b[row + x as usize]);
                self.color(index)
            }
            PixelFormat::Mono => {
                let byte = self.image.bytes().map_or(0, |b| b[row + (x / 8) as usize]);
                self.color((byte >> (7 - x % 8)) & 1)
            }
        }
    }

    /// Fast bilinear sample quantised to eighths of a pixel.
    pub fn pixel_bilinear(&self, x: f64, y: f64) -> u32 {
        sample::bilinear_fast(self.image.width(), self.image.height(), x, y, |px, py| {
            self.pixel(px, py)
        })
    }

    /// Floating-point bilinear sample.
    pub fn pixel_bilinear_exact(&self, x: f64, y: f64) -> u32 {
        sample::bilinear_exact(self.image.width(), self.image.height(), x, y, |px, py| {
            self.pixel(px, py)
        })
    }

    fn color(&self, index: u8) -> u32 {
        self.image
            .color_table()
            .get(index as usize)
            .copied()
            .unwrap_or(0)
    }
}
