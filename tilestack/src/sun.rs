//! Sun position and day/night shading.
//!
//! [`SunLocator`] tracks the subsolar point and can be updated from any
//! thread. Compositing works on a [`SunShading`] snapshot so one tile is
//! shaded with a single, consistent sun position.

use std::f64::consts::TAU;

use chrono::{DateTime, Datelike, Timelike, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::raster::color::{alpha, blue, green, red, rgb, rgba};

/// Width of the twilight band in haversine units (Earth).
pub const DEFAULT_TWILIGHT_ZONE: f64 = 0.1;

/// Brightness of the fully dark side when shading a single image.
pub const NIGHT_BRIGHTNESS: f64 = 0.35;

/// Longest interpolation step used by the scanline shader.
pub const MAX_INTERPOLATION_STEP: u32 = 30;

/// Subsolar point in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SunPosition {
    pub lon: f64,
    pub lat: f64,
}

impl SunPosition {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Approximate subsolar point at `time`.
    ///
    /// Declination follows the cosine approximation of the Earth's tilt and
    /// longitude is corrected by the equation of time.
    pub fn at(time: DateTime<Utc>) -> Self {
        let day = f64::from(time.ordinal());
        let hours = f64::from(time.hour())
            + f64::from(time.minute()) / 60.0
            + f64::from(time.second()) / 3600.0;

        let declination = -23.44_f64.to_radians() * (TAU / 365.0 * (day + 10.0)).cos();

        let b = TAU * (day - 81.0) / 364.0;
        let equation_of_time = 9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin();
        let solar_hours = hours + equation_of_time / 60.0;
        let lon = crate::coord::normalize_lon((-15.0 * (solar_hours - 12.0)).to_radians());

        Self::new(lon, declination)
    }
}

/// Thread-safe holder of the current sun position.
#[derive(Debug)]
pub struct SunLocator {
    position: RwLock<SunPosition>,
    twilight_zone: f64,
}

impl Default for SunLocator {
    fn default() -> Self {
        Self::new(SunPosition::default())
    }
}

impl SunLocator {
    pub fn new(position: SunPosition) -> Self {
        Self {
            position: RwLock::new(position),
            twilight_zone: DEFAULT_TWILIGHT_ZONE,
        }
    }

    /// Locator positioned for the current time.
    pub fn now() -> Self {
        Self::new(SunPosition::at(Utc::now()))
    }

    pub fn with_twilight_zone(mut self, twilight_zone: f64) -> Self {
        self.twilight_zone = twilight_zone;
        self
    }

    pub fn position(&self) -> SunPosition {
        *self.position.read()
    }

    pub fn set_position(&self, position: SunPosition) {
        *self.position.write() = position;
    }

    /// Moves the sun to where it stands at `time`.
    pub fn update(&self, time: DateTime<Utc>) {
        let position = SunPosition::at(time);
        debug!(
            lon = position.lon.to_degrees(),
            lat = position.lat.to_degrees(),
            "sun position updated"
        );
        self.set_position(position);
    }

    /// Consistent copy for shading one tile.
    pub fn snapshot(&self) -> SunShading {
        SunShading {
            sun: self.position(),
            twilight_zone: self.twilight_zone,
        }
    }
}

/// Per-row terms of the haversine shading formula.
#[derive(Debug, Clone, Copy)]
pub struct RowTerms {
    a: f64,
    c: f64,
}

/// Shading calculations for a fixed sun position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunShading {
    pub sun: SunPosition,
    pub twilight_zone: f64,
}

impl SunShading {
    pub fn new(sun: SunPosition) -> Self {
        Self {
            sun,
            twilight_zone: DEFAULT_TWILIGHT_ZONE,
        }
    }

    /// Haversine terms shared by every pixel of a row at latitude `lat`.
    pub fn row_terms(&self, lat: f64) -> RowTerms {
        RowTerms {
            a: ((lat - self.sun.lat) / 2.0).sin(),
            c: lat.cos() * self.sun.lat.cos(),
        }
    }

    /// Brightness at longitude `lon` in a row: 1 in daylight, 0 at night.
    ///
    /// Brightness falls linearly across the twilight band centred on the
    /// terminator (haversine 0.5).
    pub fn shading(&self, lon: f64, row: RowTerms) -> f64 {
        let b = ((lon - self.sun.lon) / 2.0).sin();
        let h = row.a * row.a + row.c * b * b;
        let half = self.twilight_zone / 2.0;

        if h <= 0.5 - half {
            1.0
        } else if h >= 0.5 + half {
            0.0
        } else {
            (0.5 + half - h) / self.twilight_zone
        }
    }

    /// Brightness at a geographic position.
    pub fn brightness_at(&self, lon: f64, lat: f64) -> f64 {
        self.shading(lon, self.row_terms(lat))
    }

    /// Walks one scanline of `width` pixels and reports the brightness of
    /// every pixel that needs shading.
    ///
    /// Brightness is probed every `step` pixels (see [`max_divisor`]). A span
    /// that is fully lit at both ends is skipped, a span dark at both ends is
    /// reported as 0 without evaluating each pixel, and any other span is
    /// evaluated pixel by pixel. The first pixel and the tail of the row are
    /// always evaluated individually.
    pub fn shade_scanline<L, F>(&self, width: u32, step: u32, row: RowTerms, lon_at: L, mut apply: F)
    where
        L: Fn(u32) -> f64,
        F: FnMut(usize, f64),
    {
        let step = step.max(1);
        let interpolation_end = step * (width / step);
        let mut last_shade = -10.0;
        let mut x = 0u32;

        while x < width {
            let interpolate = x != 0 && x < interpolation_end && x + step < width;
            let mut shade;

            if interpolate {
                shade = self.shading(lon_at(x + step), row);

                if shade == last_shade && shade == 1.0 {
                    x += step;
                    continue;
                }
                if shade == last_shade && shade == 0.0 {
                    for t in 0..step {
                        apply((x + t) as usize, 0.0);
                    }
                    x += step;
                    continue;
                }
                for _ in 0..step {
                    shade = self.shading(lon_at(x), row);
                    apply(x as usize, shade);
                    x += 1;
                }
            } else {
                shade = self.shading(lon_at(x), row);
                apply(x as usize, shade);
                x += 1;
            }
            last_shade = shade;
        }
    }

    /// Darkens `pixel` towards night according to `brightness`.
    ///
    /// Alpha is kept, so premultiplied pixels stay valid.
    pub fn shade_pixel(pixel: &mut u32, brightness: f64) {
        if brightness > 0.99999 {
            return;
        }
        let d = if brightness < 0.00001 {
            NIGHT_BRIGHTNESS
        } else {
            (1.0 - NIGHT_BRIGHTNESS) * brightness + NIGHT_BRIGHTNESS
        };
        let scale = |c: u8| (d * f64::from(c)) as u8;
        *pixel = rgba(
            scale(red(*pixel)),
            scale(green(*pixel)),
            scale(blue(*pixel)),
            alpha(*pixel),
        );
    }

    /// Mixes the day colour `pixel` with the night colour `night`.
    pub fn shade_pixel_composite(pixel: &mut u32, night: u32, brightness: f64) {
        if brightness > 0.99999 {
            return;
        }
        if brightness < 0.00001 {
            *pixel = night;
            return;
        }
        let d = brightness;
        let mix = |day: u8, night: u8| (d * f64::from(day) + (1.0 - d) * f64::from(night)) as u8;
        *pixel = rgb(
            mix(red(*pixel), red(night)),
            mix(green(*pixel), green(night)),
            mix(blue(*pixel), blue(night)),
        );
    }
}

/// Interpolation step for a scanline of `full_length` pixels.
///
/// Picks the step up to `maximum` that needs the fewest evaluations, counting
/// the probes plus the remainder that cannot be interpolated.
pub fn max_divisor(maximum: u32, full_length: u32) -> u32 {
    let mut best = 2;
    let mut evaluations_min = full_length;
    for step in 1..=maximum {
        let evaluations = full_length / step + full_length % step;
        if evaluations < evaluations_min {
            evaluations_min = evaluations;
            best = step;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::f64::consts::PI;

    fn lon_from_fraction(fraction: f64) -> f64 {
        fraction * TAU - PI
    }

    #[test]
    fn test_max_divisor() {
        assert_eq!(max_divisor(30, 256), 28);
        assert_eq!(max_divisor(30, 30), 30);
        assert_eq!(max_divisor(30, 0), 2);
    }

    #[test]
    fn test_shading_day_night_and_twilight() {
        let shading = SunShading::new(SunPosition::new(0.0, 0.0));

        assert_eq!(shading.brightness_at(0.0, 0.0), 1.0);
        assert_eq!(shading.brightness_at(PI, 0.0), 0.0);
        // on the terminator h = 0.5
        let twilight = shading.brightness_at(PI / 2.0, 0.0);
        assert!((twilight - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_shade_pixel() {
        let mut day = rgb(200, 100, 50);
        SunShading::shade_pixel(&mut day, 1.0);
        assert_eq!(day, rgb(200, 100, 50));

        let mut night = rgb(200, 100, 50);
        SunShading::shade_pixel(&mut night, 0.0);
        assert_eq!(night, rgb(70, 35, 17));
    }

    #[test]
    fn test_shade_pixel_composite() {
        let night = rgb(0, 0, 100);

        let mut dark = rgb(200, 200, 200);
        SunShading::shade_pixel_composite(&mut dark, night, 0.0);
        assert_eq!(dark, night);

        let mut half = rgb(200, 200, 200);
        SunShading::shade_pixel_composite(&mut half, night, 0.5);
        assert_eq!(half, rgb(100, 100, 150));
    }

    #[test]
    fn test_scanline_matches_per_pixel_evaluation() {
        let shading = SunShading::new(SunPosition::new(0.3, 0.2));
        let width = 256;
        let lon_at = |x: u32| lon_from_fraction(f64::from(x) / f64::from(width));
        let row = shading.row_terms(0.4);

        let mut reported = vec![1.0; width as usize];
        shading.shade_scanline(width, max_divisor(30, width), row, lon_at, |x, s| {
            reported[x] = s;
        });

        for x in 0..width {
            let expected = shading.shading(lon_at(x), row);
            // spans skipped as lit or filled as dark only differ inside
            // the twilight band, which is never skipped
            if expected == 1.0 || expected == 0.0 {
                assert_eq!(reported[x as usize], expected, "x={x}");
            }
        }
    }

    #[test]
    fn test_sun_position_at_equinox_noon() {
        let time = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let position = SunPosition::at(time);

        assert!(position.lat.to_degrees().abs() < 1.5);
        assert!(position.lon.to_degrees().abs() < 3.0);
    }

    #[test]
    fn test_sun_position_at_june_solstice() {
        let time = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
        let position = SunPosition::at(time);

        assert!((position.lat.to_degrees() - 23.44).abs() < 0.5);
        assert!((position.lon.to_degrees().abs() - 180.0).abs() < 3.0);
    }

    #[test]
    fn test_locator_update() {
        let locator = SunLocator::default();
        locator.update(Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap());
        assert!(locator.snapshot().sun.lat > 0.3);
    }
}
