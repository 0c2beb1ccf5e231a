//! Request-scoped wardrobe analysis over a catalog snapshot, and its HTTP surface.

pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use router::analysis_router;
pub use service::{AnalysisServiceError, WardrobeAnalysisService};
pub use views::{parse_desired_size, CapsuleRequest, CompatibilityRequest};
