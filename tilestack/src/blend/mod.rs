//! Blend modes for stacking texture layers.
//!
//! A layer configured with a blending is combined with the layers below it;
//! a layer without one replaces them. Blend modes form a closed set, so they
//! are modelled as an enum and selected by their theme-file name.

mod channel;
mod special;

pub use channel::ChannelBlend;

use tracing::debug;

use crate::coord::{LevelGeometry, TileId, TileProjection};
use crate::raster::Raster;
use crate::sun::SunShading;

/// Everything a blend mode may need besides the two images.
#[derive(Debug, Clone)]
pub struct BlendContext {
    /// Composited tile being built
    pub tile: TileId,
    pub geometry: LevelGeometry,
    pub projection: TileProjection,
    pub sun: SunShading,
}

/// How a layer is combined with the layers below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blending {
    /// Source-over alpha compositing
    Overpaint,
    /// Per-channel formula on opaque colours
    Channel(ChannelBlend),
    /// Uses the top red channel as cloud density, whitening the bottom
    Clouds,
    /// Uses the top red channel as intensity, weighted by top alpha
    Alpha,
    /// Replaces the bottom with the greyscale of the top
    Grayscale,
    /// Bottom is the day side, top the night side, split by the sun
    SunLight,
}

impl Blending {
    /// Looks up a blending by theme-file name.
    ///
    /// Unknown names are logged and yield `None`, so the layer is copied
    /// without blending.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let blending = match name {
            "OverpaintBlending" => Some(Blending::Overpaint),
            "CloudsBlending" => Some(Blending::Clouds),
            "AlphaBlending" => Some(Blending::Alpha),
            "GrayscaleBlending" => Some(Blending::Grayscale),
            "SunLightBlending" => Some(Blending::SunLight),
            _ => ChannelBlend::ALL
                .iter()
                .find(|mode| mode.name() == name)
                .map(|mode| Blending::Channel(*mode)),
        };
        if blending.is_none() {
            debug!(name, "unknown blending, layer will be copied");
        }
        blending
    }

    /// Theme-file name.
    pub fn name(&self) -> &'static str {
        match self {
            Blending::Overpaint => "OverpaintBlending",
            Blending::Channel(mode) => mode.name(),
            Blending::Clouds => "CloudsBlending",
            Blending::Alpha => "AlphaBlending",
            Blending::Grayscale => "GrayscaleBlending",
            Blending::SunLight => "SunLightBlending",
        }
    }

    /// Blends `top` onto `bottom` in place.
    ///
    /// `bottom` is converted to premultiplied ARGB first if needed. When the
    /// images differ in size only the overlapping area is blended.
    pub fn blend(&self, bottom: &mut Raster, top: &Raster, ctx: &BlendContext) {
        if bottom.format() != crate::raster::PixelFormat::Argb32Premultiplied {
            *bottom = bottom.to_premultiplied();
        }
        match self {
            Blending::Overpaint => special::overpaint(bottom, top),
            Blending::Channel(mode) => mode.blend(bottom, top),
            Blending::Clouds => special::clouds(bottom, top),
            Blending::Alpha => special::alpha_intensity(bottom, top),
            Blending::Grayscale => special::grayscale(bottom, top),
            Blending::SunLight => special::sun_light(bottom, top, ctx),
        }
    }
}
