//! Calendar and direction helpers shown alongside the prayer times

pub mod hijri;
pub mod qibla;

pub use hijri::HijriDate;
pub use qibla::{bearing as qibla_bearing, KAABA};
