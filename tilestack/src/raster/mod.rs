//! In-memory tile rasters.
//!
//! A [`Raster`] stores a tile image in one of the pixel formats that decoded
//! tiles and composited results use. 32-bit formats keep one `u32` per pixel
//! (`0xAARRGGBB`); the 1-bit and 8-bit formats keep packed bytes plus a colour
//! table.

pub mod color;
pub mod sample;

use std::fmt;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use thiserror::Error;

use color::{gray, premultiply, rgb, unpremultiply};

/// Pixel layout of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 1 bit per pixel, most significant bit first, through the colour table
    Mono,
    /// 8-bit index into the colour table
    Indexed8,
    /// 8-bit luminance
    Grayscale8,
    /// 32-bit opaque RGB, alpha byte ignored
    Rgb32,
    /// 32-bit straight ARGB
    Argb32,
    /// 32-bit premultiplied ARGB
    Argb32Premultiplied,
}

impl PixelFormat {
    /// Bits per pixel.
    pub fn depth(&self) -> u32 {
        match self {
            PixelFormat::Mono => 1,
            PixelFormat::Indexed8 | PixelFormat::Grayscale8 => 8,
            PixelFormat::Rgb32 | PixelFormat::Argb32 | PixelFormat::Argb32Premultiplied => 32,
        }
    }

    #[inline]
    pub fn is_32bit(&self) -> bool {
        self.depth() == 32
    }

    /// Number of storage units (bytes or words) per row of `width` pixels.
    pub fn stride_for(&self, width: u32) -> usize {
        match self {
            PixelFormat::Mono => (width as usize).div_ceil(8),
            _ => width as usize,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Mono => "mono",
            PixelFormat::Indexed8 => "indexed8",
            PixelFormat::Grayscale8 => "grayscale8",
            PixelFormat::Rgb32 => "rgb32",
            PixelFormat::Argb32 => "argb32",
            PixelFormat::Argb32Premultiplied => "argb32-premultiplied",
        };
        f.write_str(name)
    }
}

/// Raster errors.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Pixel buffer has {actual} units, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Operation not supported for {0} rasters")]
    UnsupportedFormat(PixelFormat),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, PartialEq, Eq)]
enum PixelBuffer {
    Packed(Vec<u8>),
    Words(Vec<u32>),
}

/// A tile image.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    pixels: PixelBuffer,
    color_table: Vec<u32>,
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}

impl Raster {
    /// Creates a zeroed raster. 32-bit rasters start fully transparent, or
    /// opaque black for [`PixelFormat::Rgb32`].
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = format.stride_for(width);
        let len = stride * height as usize;
        let pixels = if format.is_32bit() {
            let fill = if format == PixelFormat::Rgb32 { rgb(0, 0, 0) } else { 0 };
            PixelBuffer::Words(vec![fill; len])
        } else {
            PixelBuffer::Packed(vec![0; len])
        };
        let color_table = match format {
            PixelFormat::Mono => vec![rgb(0, 0, 0), rgb(255, 255, 255)],
            _ => Vec::new(),
        };
        Self {
            width,
            height,
            format,
            stride,
            pixels,
            color_table,
        }
    }

    /// Creates a 32-bit raster filled with `color`.
    pub fn filled(width: u32, height: u32, format: PixelFormat, color: u32) -> Self {
        let mut raster = Self::new(width, height, format);
        if let PixelBuffer::Words(words) = &mut raster.pixels {
            words.fill(color);
        }
        raster
    }

    /// Fully transparent premultiplied raster.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(width, height, PixelFormat::Argb32Premultiplied)
    }

    /// Wraps 32-bit pixels laid out row by row.
    pub fn from_words(
        width: u32,
        height: u32,
        format: PixelFormat,
        words: Vec<u32>,
    ) -> Result<Self, RasterError> {
        if !format.is_32bit() {
            return Err(RasterError::UnsupportedFormat(format));
        }
        let expected = width as usize * height as usize;
        if words.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: words.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            stride: width as usize,
            pixels: PixelBuffer::Words(words),
            color_table: Vec::new(),
        })
    }

    /// Wraps packed 1-bit or 8-bit pixels with their colour table.
    ///
    /// Rows are `ceil(width / 8)` bytes for mono rasters and `width` bytes
    /// otherwise. The colour table is ignored for greyscale rasters.
    pub fn from_bytes(
        width: u32,
        height: u32,
        format: PixelFormat,
        bytes: Vec<u8>,
        color_table: Vec<u32>,
    ) -> Result<Self, RasterError> {
        if format.is_32bit() {
            return Err(RasterError::UnsupportedFormat(format));
        }
        let stride = format.stride_for(width);
        let expected = stride * height as usize;
        if bytes.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            stride,
            pixels: PixelBuffer::Packed(bytes),
            color_table,
        })
    }

    /// Decodes an encoded image (PNG or JPEG).
    pub fn decode(data: &[u8]) -> Result<Self, RasterError> {
        Ok(Self::from_dynamic_image(image::load_from_memory(data)?))
    }

    /// Decodes an image file.
    pub fn open(path: &Path) -> Result<Self, RasterError> {
        let data = std::fs::read(path)?;
        Self::decode(&data)
    }

    /// Converts a decoded image, keeping greyscale images at 8 bits.
    pub fn from_dynamic_image(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(buffer) => {
                let (width, height) = buffer.dimensions();
                Self {
                    width,
                    height,
                    format: PixelFormat::Grayscale8,
                    stride: width as usize,
                    pixels: PixelBuffer::Packed(buffer.into_raw()),
                    color_table: Vec::new(),
                }
            }
            DynamicImage::ImageRgb8(buffer) => {
                let (width, height) = buffer.dimensions();
                let words = buffer
                    .pixels()
                    .map(|p| rgb(p.0[0], p.0[1], p.0[2]))
                    .collect();
                Self {
                    width,
                    height,
                    format: PixelFormat::Rgb32,
                    stride: width as usize,
                    pixels: PixelBuffer::Words(words),
                    color_table: Vec::new(),
                }
            }
            other => Self::from_rgba_image(&other.to_rgba8()),
        }
    }

    /// Converts straight RGBA pixels into an [`PixelFormat::Argb32`] raster.
    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let words = image
            .pixels()
            .map(|p| color::rgba(p.0[0], p.0[1], p.0[2], p.0[3]))
            .collect();
        Self {
            width,
            height,
            format: PixelFormat::Argb32,
            stride: width as usize,
            pixels: PixelBuffer::Words(words),
            color_table: Vec::new(),
        }
    }

    /// Straight RGBA copy of this raster.
    pub fn to_rgba_image(&self) -> RgbaImage {
        ImageBuffer::from_fn(self.width, self.height, |x, y| {
            let c = self.argb(x, y);
            Rgba([color::red(c), color::green(c), color::blue(c), color::alpha(c)])
        })
    }

    /// Encodes the raster as PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), RasterError> {
        self.to_rgba_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.format.depth()
    }

    /// True for rasters without pixels.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Storage units (bytes or words) per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn color_table(&self) -> &[u32] {
        &self.color_table
    }

    /// Memory used by the pixel data in bytes.
    pub fn byte_count(&self) -> usize {
        match &self.pixels {
            PixelBuffer::Packed(bytes) => bytes.len(),
            PixelBuffer::Words(words) => words.len() * 4,
        }
    }

    /// Packed pixel storage, for 1-bit and 8-bit rasters.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.pixels {
            PixelBuffer::Packed(bytes) => Some(bytes),
            PixelBuffer::Words(_) => None,
        }
    }

    /// Pixel storage, for 32-bit rasters.
    pub fn words(&self) -> Option<&[u32]> {
        match &self.pixels {
            PixelBuffer::Words(words) => Some(words),
            PixelBuffer::Packed(_) => None,
        }
    }

    /// Mutable pixel storage, for 32-bit rasters.
    pub fn words_mut(&mut self) -> Option<&mut [u32]> {
        match &mut self.pixels {
            PixelBuffer::Words(words) => Some(words),
            PixelBuffer::Packed(_) => None,
        }
    }

    /// One row of a 32-bit raster.
    pub fn row(&self, y: u32) -> Option<&[u32]> {
        let start = y as usize * self.stride;
        self.words().and_then(|w| w.get(start..start + self.stride))
    }

    /// One mutable row of a 32-bit raster.
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u32]> {
        let stride = self.stride;
        let start = y as usize * stride;
        self.words_mut().and_then(|w| w.get_mut(start..start + stride))
    }

    /// Colour at `(x, y)`.
    ///
    /// 32-bit formats return the stored value, so premultiplied rasters yield
    /// premultiplied colours. Indexed formats resolve through the colour
    /// table; unknown indices yield transparent black.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let offset = y as usize * self.stride;
        match &self.pixels {
            PixelBuffer::Words(words) => {
                let value = words[offset + x as usize];
                if self.format == PixelFormat::Rgb32 {
                    value | 0xff00_0000
                } else {
                    value
                }
            }
            PixelBuffer::Packed(bytes) => match self.format {
                PixelFormat::Grayscale8 => {
                    let v = bytes[offset + x as usize];
                    rgb(v, v, v)
                }
                PixelFormat::Mono => {
                    let byte = bytes[offset + (x / 8) as usize];
                    let index = (byte >> (7 - (x % 8))) & 1;
                    self.lookup(index)
                }
                _ => self.lookup(bytes[offset + x as usize]),
            },
        }
    }

    /// Straight (non-premultiplied) colour at `(x, y)`.
    pub fn argb(&self, x: u32, y: u32) -> u32 {
        let value = self.pixel(x, y);
        if self.format == PixelFormat::Argb32Premultiplied {
            unpremultiply(value)
        } else {
            value
        }
    }

    /// Writes a colour in this raster's 32-bit encoding.
    ///
    /// Non-32-bit rasters are left unchanged.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.stride + x as usize;
        if let PixelBuffer::Words(words) = &mut self.pixels {
            words[index] = value;
        }
    }

    /// Copy of this raster in another format.
    ///
    /// Converting to a 1-bit or 8-bit format is not supported.
    pub fn convert_to(&self, format: PixelFormat) -> Result<Raster, RasterError> {
        if format == self.format {
            return Ok(self.clone());
        }
        if !format.is_32bit() {
            return Err(RasterError::UnsupportedFormat(format));
        }

        let mut out = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let straight = self.argb(x, y);
                out.push(match format {
                    PixelFormat::Argb32Premultiplied => premultiply(straight),
                    PixelFormat::Rgb32 => straight | 0xff00_0000,
                    _ => straight,
                });
            }
        }
        Raster::from_words(self.width, self.height, format, out)
    }

    /// Premultiplied 32-bit copy, the working format for compositing.
    pub fn to_premultiplied(&self) -> Raster {
        match self.convert_to(PixelFormat::Argb32Premultiplied) {
            Ok(raster) => raster,
            // 32-bit targets always convert
            Err(_) => Raster::transparent(self.width, self.height),
        }
    }

    /// Straight 32-bit copy, used to read colours independent of the source format.
    pub fn to_straight(&self) -> Raster {
        match self.convert_to(PixelFormat::Argb32) {
            Ok(raster) => raster,
            Err(_) => Raster::new(self.width, self.height, PixelFormat::Argb32),
        }
    }

    /// Nearest-neighbour rescale into a straight ARGB raster.
    pub fn scaled(&self, width: u32, height: u32) -> Raster {
        let resized = image::imageops::resize(
            &self.to_rgba_image(),
            width,
            height,
            image::imageops::FilterType::Nearest,
        );
        Raster::from_rgba_image(&resized)
    }

    /// Sub-rectangle as a straight ARGB raster, clipped to the image.
    pub fn cropped(&self, x: u32, y: u32, width: u32, height: u32) -> Raster {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);
        let sub = image::imageops::crop_imm(&self.to_rgba_image(), x, y, width, height).to_image();
        Raster::from_rgba_image(&sub)
    }

    /// Bilinear sample of the straight colour at a sub-pixel position.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> u32 {
        if self.is_null() {
            return 0;
        }
        sample::bilinear_exact(self.width, self.height, x, y, |px, py| self.argb(px, py))
    }

    /// Greyscale value of the pixel, through [`color::gray`].
    pub fn gray(&self, x: u32, y: u32) -> u8 {
        gray(self.argb(x, y))
    }

    fn lookup(&self, index: u8) -> u32 {
        self.color_table.get(index as usize).copied().unwrap_or(0)
    }
}
