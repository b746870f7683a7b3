//! Core types for the Tiffin client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod geo;
pub mod id;
pub mod money;
pub mod status;

pub use geo::{GeoPoint, format_distance, haversine_km};
pub use id::*;
pub use money::Money;
pub use status::*;
