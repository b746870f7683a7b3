//! Tiffin Core - Shared domain types.
//!
//! This crate provides common types used across all Tiffin client components:
//! - `client` - Async-state and normalized-cache layer behind the screens
//! - `integration-tests` - End-to-end flow tests over a scripted transport
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, status enums, and geo primitives

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
