//! Wardrobe outfit compatibility analysis and capsule selection.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use error::AppError;
