//! Geographic bounding boxes.
//!
//! All angles are radians. Longitudes are normalized to `[-π, π]`, and a box
//! whose west edge lies east of its east edge crosses the date line.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Wraps a longitude into `[-π, π]`.
pub fn normalize_lon(lon: f64) -> f64 {
    if (-PI..=PI).contains(&lon) {
        return lon;
    }
    let wrapped = (lon + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI && lon > 0.0 {
        PI
    } else {
        wrapped
    }
}

/// Clamps a latitude into `[-π/2, π/2]`.
#[inline]
pub fn normalize_lat(lat: f64) -> f64 {
    lat.clamp(-FRAC_PI_2, FRAC_PI_2)
}

/// Latitude/longitude box with an optional rotation about its centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    /// Counter-clockwise rotation in radians
    pub rotation: f64,
}

impl Default for LatLonBox {
    /// The whole globe.
    fn default() -> Self {
        Self::new(FRAC_PI_2, -FRAC_PI_2, PI, -PI)
    }
}

impl LatLonBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north: normalize_lat(north),
            south: normalize_lat(south),
            east: normalize_lon(east),
            west: normalize_lon(west),
            rotation: 0.0,
        }
    }

    /// Builds a box from degrees.
    pub fn from_degrees(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self::new(
            north.to_radians(),
            south.to_radians(),
            east.to_radians(),
            west.to_radians(),
        )
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline]
    pub fn crosses_date_line(&self) -> bool {
        self.east < self.west
    }

    /// Longitudinal extent, accounting for the date line.
    pub fn width(&self) -> f64 {
        if self.crosses_date_line() {
            self.east - self.west + TAU
        } else {
            self.east - self.west
        }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Centre as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            normalize_lon(self.west + self.width() / 2.0),
            (self.north + self.south) / 2.0,
        )
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        let lon = normalize_lon(lon);
        if self.crosses_date_line() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        }
    }

    /// Returns true if the two boxes share any area (edges included).
    pub fn intersects(&self, other: &LatLonBox) -> bool {
        if self.south > other.north || other.south > self.north {
            return false;
        }
        self.lon_spans().iter().any(|(w1, e1)| {
            other
                .lon_spans()
                .iter()
                .any(|(w2, e2)| w1 <= e2 && w2 <= e1)
        })
    }

    /// Smallest unrotated box that contains this box after rotation.
    pub fn circumscribed(&self) -> LatLonBox {
        if self.rotation == 0.0 {
            return *self;
        }

        let (center_lon, center_lat) = self.center();
        let half_w = self.width() / 2.0;
        let half_h = self.height() / 2.0;
        let (sin, cos) = self.rotation.sin_cos();

        let corners = [
            (-half_w, -half_h),
            (half_w, -half_h),
            (half_w, half_h),
            (-half_w, half_h),
        ];
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;
        for (x, y) in corners {
            let rx = x * cos - y * sin;
            let ry = x * sin + y * cos;
            min_x = min_x.min(rx);
            max_x = max_x.max(rx);
            min_y = min_y.min(ry);
            max_y = max_y.max(ry);
        }

        if max_x - min_x >= TAU {
            return LatLonBox::new(center_lat + max_y, center_lat + min_y, PI, -PI);
        }
        LatLonBox::new(
            center_lat + max_y,
            center_lat + min_y,
            center_lon + max_x,
            center_lon + min_x,
        )
    }

    fn lon_spans(&self) -> Vec<(f64, f64)> {
        if self.crosses_date_line() {
            vec![(self.west, PI), (-PI, self.east)]
        } else {
            vec![(self.west, self.east)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_normalize_lon_wraps() {
        assert!((normalize_lon(3.0 * PI / 2.0) - (-PI / 2.0)).abs() < EPS);
        assert!((normalize_lon(-3.0 * PI / 2.0) - (PI / 2.0)).abs() < EPS);
        assert_eq!(normalize_lon(PI), PI);
        assert_eq!(normalize_lon(0.5), 0.5);
    }

    #[test]
    fn test_width_across_date_line() {
        let bbox = LatLonBox::from_degrees(10.0, -10.0, -170.0, 170.0);
        assert!(bbox.crosses_date_line());
        assert!((bbox.width() - 20f64.to_radians()).abs() < EPS);
        let (lon, lat) = bbox.center();
        assert!((lon.abs() - PI).abs() < EPS);
        assert!(lat.abs() < EPS);
    }

    #[test]
    fn test_contains() {
        let bbox = LatLonBox::from_degrees(10.0, -10.0, -170.0, 170.0);
        assert!(bbox.contains(175f64.to_radians(), 0.0));
        assert!(bbox.contains((-175f64).to_radians(), 0.0));
        assert!(!bbox.contains(0.0, 0.0));
        assert!(!bbox.contains(175f64.to_radians(), 0.5));
    }

    #[test]
    fn test_intersects() {
        let europe = LatLonBox::from_degrees(70.0, 35.0, 40.0, -10.0);
        let africa = LatLonBox::from_degrees(37.0, -35.0, 52.0, -18.0);
        let pacific = LatLonBox::from_degrees(30.0, -30.0, -150.0, 150.0);
        let asia_east = LatLonBox::from_degrees(50.0, 20.0, 160.0, 120.0);

        assert!(europe.intersects(&africa));
        assert!(!europe.intersects(&pacific));
        assert!(pacific.intersects(&asia_east));
        assert!(asia_east.intersects(&pacific));
    }

    #[test]
    fn test_circumscribed_unrotated_is_identity() {
        let bbox = LatLonBox::from_degrees(10.0, 0.0, 20.0, 0.0);
        assert_eq!(bbox.circumscribed(), bbox);
    }

    #[test]
    fn test_circumscribed_quarter_turn_swaps_extents() {
        let bbox = LatLonBox::from_degrees(5.0, -5.0, 10.0, -10.0).with_rotation(PI / 2.0);
        let outer = bbox.circumscribed();

        assert!((outer.width() - 10f64.to_radians()).abs() < 1e-6);
        assert!((outer.height() - 20f64.to_radians()).abs() < 1e-6);
    }
}
