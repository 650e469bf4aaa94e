//! Tile storage and download collaborator.
//!
//! The compositor never touches the filesystem or the network itself. It asks
//! a [`TileSource`] for a layer's image of a cell and for the freshness of
//! that image, and requests downloads through it. [`FileTileSource`] is the
//! disk-backed implementation; downloads are published as
//! [`DownloadRequest`] values for whoever performs the transfer.

mod file;

pub use file::FileTileSource;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::{CoordError, TileId};
use crate::layer::TextureLayer;
use crate::raster::{Raster, RasterError};

/// Freshness of a stored tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileStatus {
    /// Stored and younger than the layer's expiry
    Available,
    /// Stored but older than the layer's expiry
    Expired,
    /// Not stored, or not decodable
    Missing,
}

impl fmt::Display for TileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileStatus::Available => write!(f, "available"),
            TileStatus::Expired => write!(f, "expired"),
            TileStatus::Missing => write!(f, "missing"),
        }
    }
}

/// Why a download is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadUsage {
    /// Interactive viewing; served first
    Browse,
    /// Region download for offline use
    Bulk,
}

/// A tile the source wants fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub id: TileId,
    /// Destination relative to the storage root
    pub relative_path: PathBuf,
    pub usage: DownloadUsage,
}

impl DownloadRequest {
    /// Identifier handed back on completion (`source:level:column:row`).
    pub fn id_string(&self) -> String {
        self.id.to_id_string()
    }
}

/// Errors from storing tiles.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("tile I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("tile image is not decodable: {0}")]
    Decode(#[from] RasterError),

    #[error("invalid tile id: {0}")]
    InvalidId(#[from] CoordError),

    #[error("tile {id} does not belong to layer '{layer}'")]
    WrongLayer { id: TileId, layer: String },
}

/// Where the compositor gets raw layer tiles from.
///
/// Loading never fails: a missing tile is replaced by a stand-in image and a
/// download is requested.
pub trait TileSource: Send + Sync {
    /// Image of `layer` for the raw address `id`.
    fn load_tile_image(&self, layer: &TextureLayer, id: &TileId, usage: DownloadUsage) -> Raster;

    /// Requests a (re-)download without checking freshness.
    fn download_tile(&self, layer: &TextureLayer, id: &TileId, usage: DownloadUsage);

    /// Freshness of the stored tile for `id`.
    fn tile_status(&self, layer: &TextureLayer, id: &TileId) -> TileStatus;

    /// Deepest level with data for `layer`.
    ///
    /// Defaults to the configured maximum.
    fn maximum_tile_level(&self, layer: &TextureLayer) -> Option<u32> {
        layer.maximum_tile_level
    }
}
