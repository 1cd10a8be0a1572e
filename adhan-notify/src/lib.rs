//! adhan-notify library
//!
//! Prayer-time notification scheduling: per-prayer preferences, sound
//! resolution, and in-process or OS-level notification adapters.
//! The daemon in `main.rs` is a thin shell over this library.

pub mod app;
pub mod calendar;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod platform;
pub mod services;
pub mod storage;
