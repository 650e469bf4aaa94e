use std::f64::consts::TAU;

use crate::coord::{normalize_lat, normalize_lon, LatLonBox, TileProjection};
use crate::raster::color::source_over;
use crate::raster::{PixelFormat, Raster};

/// A georeferenced image painted over the composited tiles.
#[derive(Debug, Clone)]
pub struct GroundOverlay {
    image: Raster,
    lat_lon_box: LatLonBox,
}

impl GroundOverlay {
    /// Creates an overlay; the image is kept in straight ARGB for sampling.
    pub fn new(image: Raster, lat_lon_box: LatLonBox) -> Self {
        let image = if image.format() == PixelFormat::Argb32 {
            image
        } else {
            image.to_straight()
        };
        Self { image, lat_lon_box }
    }

    pub fn image(&self) -> &Raster {
        &self.image
    }

    pub fn lat_lon_box(&self) -> &LatLonBox {
        &self.lat_lon_box
    }

    /// Whether any part of the rotated overlay can fall inside `footprint`.
    pub fn touches(&self, footprint: &LatLonBox) -> bool {
        footprint.intersects(&self.lat_lon_box.circumscribed())
    }

    /// Paints the overlay onto a premultiplied tile image covering `footprint`.
    ///
    /// Every tile pixel is rotated about the overlay centre by the inverse of
    /// the overlay rotation and, when it lands inside the overlay box, the
    /// overlay is sampled bilinearly and composited over it.
    pub fn render(&self, tile: &mut Raster, footprint: &LatLonBox, projection: TileProjection) {
        let bbox = &self.lat_lon_box;
        if self.image.is_null() || tile.is_null() || bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return;
        }

        let tile_width = tile.width();
        let tile_height = tile.height();
        let (sin_rot, cos_rot) = (-bbox.rotation).sin_cos();
        let (center_lon, center_lat) = bbox.center();
        let circumscribed_west = bbox.circumscribed().west;

        let pixel_to_lon = footprint.width() / f64::from(tile_width);
        let north_y = projection.y_at(footprint.north);
        let south_y = projection.y_at(footprint.south);
        let image_width = f64::from(self.image.width());
        let image_height = f64::from(self.image.height());
        let lon_to_pixel = image_width / bbox.width();
        let lat_to_pixel = image_height / bbox.height();

        for y in 0..tile_height {
            let fraction = f64::from(y) / f64::from(tile_height);
            let lat = projection.lat_at(north_y + (south_y - north_y) * fraction);
            let Some(row) = tile.row_mut(y) else {
                continue;
            };

            for (x, pixel) in row.iter_mut().enumerate() {
                let lon = normalize_lon(footprint.west + x as f64 * pixel_to_lon);
                let center_lon = if bbox.crosses_date_line() {
                    shifted_center(bbox, center_lon, circumscribed_west, lon)
                } else {
                    center_lon
                };

                let d_lon = lon - center_lon;
                let d_lat = lat - center_lat;
                let rotated_lon = normalize_lon(d_lon * cos_rot - d_lat * sin_rot + center_lon);
                let rotated_lat = normalize_lat(d_lon * sin_rot + d_lat * cos_rot + center_lat);

                if !bbox.contains(rotated_lon, rotated_lat) {
                    continue;
                }

                let px = (rotated_lon - bbox.west).rem_euclid(TAU) * lon_to_pixel;
                let py = image_height - (rotated_lat - bbox.south) * lat_to_pixel - 1.0;
                if px >= 0.0 && px < image_width && py >= 0.0 && py < image_height {
                    *pixel = source_over(*pixel, self.image.sample_bilinear(px, py));
                }
            }
        }
    }
}

/// Moves the overlay centre onto the same side of the date line as `lon`.
fn shifted_center(bbox: &LatLonBox, center_lon: f64, circumscribed_west: f64, lon: f64) -> f64 {
    let mut center = center_lon;
    if lon < 0.0 && center > 0.0 {
        center -= TAU;
    }
    if lon > 0.0 && center < 0.0 {
        center += TAU;
    }
    // both edges east of the meridian, west edge past the east edge
    if bbox.west > 0.0
        && bbox.east > 0.0
        && lon > 0.0
        && lon < bbox.west
        && lon <= circumscribed_west
    {
        center -= TAU;
    }
    center
}
