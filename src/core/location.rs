//! Geographic locations in MAVLink fixed-point units
//!
//! Latitude and longitude are stored in 1e-7 degrees and altitude in
//! centimeters, matching the integer fields used on the wire.

/// Mean earth radius used for local offset conversion (meters)
pub const RADIUS_OF_EARTH: f64 = 6_378_100.0;

/// Degrees to 1e-7 degree fixed point
const DEG_TO_E7: f64 = 1.0e7;

/// Meters to centimeters
const M_TO_CM: f64 = 100.0;

/// Latitude limit in 1e-7 degrees
const MAX_LAT_E7: u32 = 900_000_000;

/// Longitude limit in 1e-7 degrees
const MAX_LNG_E7: u32 = 1_800_000_000;

const RAD_TO_DEG: f64 = 180.0 / core::f64::consts::PI;
const DEG_TO_RAD: f64 = core::f64::consts::PI / 180.0;

/// Altitude reference for a [`Location`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AltFrame {
    /// Altitude above mean sea level
    #[default]
    Absolute,
    /// Altitude relative to the home location
    AboveHome,
}

/// A position on the earth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Location {
    /// Latitude in 1e-7 degrees
    pub lat: i32,
    /// Longitude in 1e-7 degrees
    pub lng: i32,
    /// Altitude in centimeters
    pub alt: i32,
    /// Altitude reference
    pub frame: AltFrame,
}

impl Location {
    /// Create a location from fixed-point components
    pub const fn new(lat: i32, lng: i32, alt: i32, frame: AltFrame) -> Self {
        Self {
            lat,
            lng,
            alt,
            frame,
        }
    }

    /// Build a location from degrees and meters
    ///
    /// Values are truncated toward zero when converted to fixed point.
    pub fn from_degrees(lat_deg: f32, lng_deg: f32, alt_m: f32, frame: AltFrame) -> Self {
        Self {
            lat: (lat_deg as f64 * DEG_TO_E7) as i32,
            lng: (lng_deg as f64 * DEG_TO_E7) as i32,
            alt: (alt_m as f64 * M_TO_CM) as i32,
            frame,
        }
    }

    /// Build a location from a local NED offset relative to `origin`
    ///
    /// `north_m`/`east_m` are projected with an equirectangular approximation
    /// about the origin latitude. `down_m` becomes an altitude above home.
    pub fn from_local_ned(origin: &Location, north_m: f32, east_m: f32, down_m: f32) -> Self {
        let origin_lat_rad = origin.lat as f64 / DEG_TO_E7 * DEG_TO_RAD;
        let lat_offset =
            north_m as f64 / (RADIUS_OF_EARTH * libm::cos(origin_lat_rad)) * RAD_TO_DEG;
        let lng_offset = east_m as f64 / RADIUS_OF_EARTH * RAD_TO_DEG;

        // Sum in f64; the cast saturates instead of overflowing
        Self {
            lat: (lat_offset * DEG_TO_E7 + origin.lat as f64) as i32,
            lng: (lng_offset * DEG_TO_E7 + origin.lng as f64) as i32,
            alt: -(down_m as f64 * M_TO_CM) as i32,
            frame: AltFrame::AboveHome,
        }
    }

    /// Whether latitude and longitude lie on the globe (±90°, ±180°)
    pub fn is_valid(&self) -> bool {
        self.lat.unsigned_abs() <= MAX_LAT_E7 && self.lng.unsigned_abs() <= MAX_LNG_E7
    }

    /// Latitude in degrees
    pub fn lat_deg(&self) -> f64 {
        self.lat as f64 / DEG_TO_E7
    }

    /// Longitude in degrees
    pub fn lng_deg(&self) -> f64 {
        self.lng as f64 / DEG_TO_E7
    }
}
