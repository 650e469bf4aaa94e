//! Disk-backed tile source.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::SystemTime;

use image::ImageReader;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{DownloadRequest, DownloadUsage, SourceError, TileSource, TileStatus};
use crate::coord::TileId;
use crate::layer::TextureLayer;
use crate::raster::Raster;

/// Digits used for row and column numbers in tile file names.
const TILE_DIGITS: usize = 6;

/// Tile source reading layer tiles from a directory tree.
///
/// Tiles are stored as:
///
/// ```text
/// <root>/<source_dir>/<level>/<row>/<row>_<column>.<format>
/// ```
///
/// with row and column zero-padded to six digits.
#[derive(Debug)]
pub struct FileTileSource {
    root: PathBuf,
    downloads: Option<Sender<DownloadRequest>>,
    /// Stored files that failed to decode; reported as missing until replaced
    undecodable: Mutex<HashSet<PathBuf>>,
}

impl FileTileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            downloads: None,
            undecodable: Mutex::new(HashSet::new()),
        }
    }

    /// Publishes download requests on `sender`.
    pub fn with_download_sender(mut self, sender: Sender<DownloadRequest>) -> Self {
        self.downloads = Some(sender);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a tile relative to the storage root.
    pub fn relative_tile_path(layer: &TextureLayer, id: &TileId) -> PathBuf {
        PathBuf::from(&layer.source_dir)
            .join(id.level.to_string())
            .join(format!("{:0width$}", id.row, width = TILE_DIGITS))
            .join(format!(
                "{:0width$}_{:0width$}.{}",
                id.row,
                id.column,
                layer.file_format,
                width = TILE_DIGITS
            ))
    }

    /// Absolute path of a tile.
    pub fn tile_path(&self, layer: &TextureLayer, id: &TileId) -> PathBuf {
        self.root.join(Self::relative_tile_path(layer, id))
    }

    /// Writes a downloaded tile and returns its decoded image.
    ///
    /// The data is decoded before anything is written, so undecodable
    /// downloads never reach the store.
    pub fn store_tile(
        &self,
        layer: &TextureLayer,
        id: &TileId,
        data: &[u8],
    ) -> Result<Raster, SourceError> {
        if id.source != layer.source_dir {
            return Err(SourceError::WrongLayer {
                id: id.clone(),
                layer: layer.name.clone(),
            });
        }
        let image = Raster::decode(data)?;

        let path = self.tile_path(layer, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        self.undecodable.lock().remove(&path);
        debug!(tile = %id, path = %path.display(), "stored tile");

        Ok(image)
    }

    /// Deepest level directory holding data for `layer`.
    pub fn detect_maximum_tile_level(&self, layer: &TextureLayer) -> Option<u32> {
        let entries = fs::read_dir(self.root.join(&layer.source_dir)).ok()?;
        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .max()
    }

    /// Whether every level-zero tile of `layer` is stored.
    pub fn base_tiles_available(&self, layer: &TextureLayer) -> bool {
        let geometry = layer.geometry;
        (0..geometry.level_zero_columns).all(|column| {
            (0..geometry.level_zero_rows).all(|row| {
                let id = TileId::new(layer.source_dir.as_str(), 0, column, row);
                let exists = self.tile_path(layer, &id).exists();
                if !exists {
                    debug!(tile = %id, "base tile is missing");
                }
                exists
            })
        })
    }

    fn trigger_download(&self, layer: &TextureLayer, id: &TileId, usage: DownloadUsage) {
        let Some(sender) = &self.downloads else {
            return;
        };
        let request = DownloadRequest {
            id: id.clone(),
            relative_path: Self::relative_tile_path(layer, id),
            usage,
        };
        if sender.send(request).is_err() {
            debug!(tile = %id, "download receiver is gone, request dropped");
        }
    }

    fn read_tile(&self, layer: &TextureLayer, id: &TileId) -> Option<Raster> {
        let path = self.tile_path(layer, id);
        if !path.exists() {
            return None;
        }
        match Raster::open(&path) {
            Ok(image) if !image.is_null() => Some(image),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to decode tile");
                self.undecodable.lock().insert(path);
                None
            }
        }
    }

    /// Stand-in for a missing tile: the matching part of the nearest stored
    /// ancestor, scaled up to full size.
    ///
    /// Falls back to a transparent tile when not even level zero is stored.
    fn scaled_lower_level_tile(&self, layer: &TextureLayer, id: &TileId) -> Raster {
        for level in (0..id.level).rev() {
            let delta = id.level - level;
            let ancestor = TileId::new(
                id.source.as_str(),
                level,
                id.column.checked_shr(delta).unwrap_or(0),
                id.row.checked_shr(delta).unwrap_or(0),
            );
            let Some(image) = self.read_tile(layer, &ancestor) else {
                continue;
            };

            let span = 1u64 << delta.min(63);
            let part_width = image.width().checked_shr(delta).unwrap_or(0).max(1);
            let part_height = image.height().checked_shr(delta).unwrap_or(0).max(1);
            let start_x = (u64::from(id.column) % span) as u32 * part_width;
            let start_y = (u64::from(id.row) % span) as u32 * part_height;
            debug!(tile = %id, ancestor = %ancestor, "scaling lower level tile");

            return image
                .cropped(start_x, start_y, part_width, part_height)
                .scaled(image.width(), image.height());
        }

        debug!(tile = %id, "no level zero tile stored, using a transparent tile");
        Raster::transparent(layer.tile_size.width, layer.tile_size.height)
    }
}

impl TileSource for FileTileSource {
    fn load_tile_image(&self, layer: &TextureLayer, id: &TileId, usage: DownloadUsage) -> Raster {
        match self.tile_status(layer, id) {
            TileStatus::Available => {
                if let Some(image) = self.read_tile(layer, id) {
                    return image;
                }
            }
            TileStatus::Expired => {
                debug!(tile = %id, "tile expired");
                self.trigger_download(layer, id, usage);
                if let Some(image) = self.read_tile(layer, id) {
                    return image;
                }
            }
            TileStatus::Missing => {}
        }

        let replacement = self.scaled_lower_level_tile(layer, id);
        self.trigger_download(layer, id, usage);
        replacement
    }

    fn download_tile(&self, layer: &TextureLayer, id: &TileId, usage: DownloadUsage) {
        self.trigger_download(layer, id, usage);
    }

    fn tile_status(&self, layer: &TextureLayer, id: &TileId) -> TileStatus {
        let path = self.tile_path(layer, id);
        let Ok(metadata) = fs::metadata(&path) else {
            return TileStatus::Missing;
        };
        if self.undecodable.lock().contains(&path) || !has_image_header(&path) {
            return TileStatus::Missing;
        }
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default();

        if age.as_secs() >= layer.expire_secs {
            TileStatus::Expired
        } else {
            TileStatus::Available
        }
    }

    fn maximum_tile_level(&self, layer: &TextureLayer) -> Option<u32> {
        layer
            .maximum_tile_level
            .or_else(|| self.detect_maximum_tile_level(layer))
    }
}

/// Whether `path` starts with a readable image header of a known format.
fn has_image_header(path: &Path) -> bool {
    ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_or(false, |reader| reader.into_dimensions().is_ok())
}
