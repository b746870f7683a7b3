//! Tiffin client state core.
//!
//! This crate is the async-state and normalized-cache layer that sits between
//! the Tiffin screens and the remote REST API. Screens issue intents
//! (operations on the stores below), the owning store talks to the backend
//! through the [`transport::Transport`] collaborator, and subscribers
//! re-render from immutable snapshots when the change channel ticks.
//!
//! # Architecture
//!
//! - One store per domain slice: cart, catalog, restaurants, orders,
//!   addresses, auth, plus a transient notification bus.
//! - Every async operation is tracked by a [`request::RequestEnvelope`]
//!   carrying a monotonic sequence number; a response is applied only if its
//!   originating sequence is still current (stale-response suppression).
//! - All mutations run under each store's own lock, never across an await
//!   point, so completion handlers apply one at a time.
//! - [`registry::AppStores`] wires the stores together with a shared
//!   transport and a single `tokio::sync::watch` change channel. It is an
//!   explicitly constructed instance - there is no global state.
//!
//! # Example
//!
//! ```rust,ignore
//! use tiffin_client::config::ApiConfig;
//! use tiffin_client::registry::AppStores;
//! use tiffin_client::storage::MemoryTokenStore;
//!
//! let config = ApiConfig::from_env()?;
//! let stores = AppStores::connect(config, MemoryTokenStore::default())?;
//! stores.auth().bootstrap().await;
//!
//! let mut changes = stores.subscribe();
//! stores.catalog().fetch_products(1, 20).await;
//! changes.changed().await?;
//! let snapshot = stores.catalog().snapshot();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod endpoints;
pub mod entity;
pub mod error;
pub mod location;
pub mod normalize;
pub mod registry;
pub mod request;
pub mod storage;
pub mod stores;
pub mod transport;
pub mod types;
