//! Geolocation collaborator.
//!
//! The platform shell owns permission prompts and the actual position API;
//! the core only consumes the result. A provider that cannot produce a
//! position returns `None`, and callers fall back to unscoped queries.

use std::future::Future;

use tiffin_core::GeoPoint;

/// Source of the device's current position.
pub trait LocationProvider: Send + Sync {
    /// Current position, or `None` when unavailable (permission denied,
    /// sensors off, timeout).
    fn current_position(&self) -> impl Future<Output = Option<GeoPoint>> + Send;
}

/// Provider pinned to a fixed position, for tests and simulators.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoPoint);

impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Option<GeoPoint> {
        Some(self.0)
    }
}

/// Provider that never produces a position.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationProvider for NoLocation {
    async fn current_position(&self) -> Option<GeoPoint> {
        None
    }
}
