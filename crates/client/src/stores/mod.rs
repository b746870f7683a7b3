//! State slices, one store per domain.
//!
//! Each store exclusively owns its entity collection and request envelopes;
//! no store mutates another's state directly. Cross-store effects happen
//! through injected collaborators only: the shared
//! [`RequestContext`](crate::transport::RequestContext) for request
//! decoration, and the [`toast::NotificationBus`] for mutation-failure
//! feedback.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod restaurants;
pub mod toast;

pub use addresses::AddressStore;
pub use auth::{AuthPhase, AuthStore};
pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use orders::OrderStore;
pub use restaurants::{GeoQuery, RestaurantStore};
pub use toast::{NotificationBus, Toast, ToastKind};
