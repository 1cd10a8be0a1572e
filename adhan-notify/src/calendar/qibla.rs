//! Qibla direction
//!
//! Initial great-circle bearing from the device to the Kaaba.

use crate::config::Location;

/// Coordinates of the Kaaba, Makkah
pub const KAABA: Location = Location {
    latitude: 21.4225,
    longitude: 39.8262,
};

/// Degrees clockwise from true north, in `[0, 360)`
pub fn bearing(from: Location) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = KAABA.latitude.to_radians();
    let delta_lambda = (KAABA.longitude - from.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}
