//! Restaurant slice: the general list and the nearby-query results.
//!
//! Two collections, two intents: `restaurants` answers "what can I order
//! from" (unscoped or radius-scoped, last query wins), `near_by` answers a
//! specific geo query from the map/explore views. They are never merged;
//! readers prefer `near_by` when it is non-empty and fall back to
//! `restaurants` otherwise.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};

use tiffin_core::GeoPoint;

use crate::endpoints;
use crate::entity::EntityStore;
use crate::normalize;
use crate::registry::ChangeNotifier;
use crate::request::RequestEnvelope;
use crate::transport::{Method, Transport};
use crate::types::Restaurant;

/// A location plus radius scoping a restaurant search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoQuery {
    pub center: GeoPoint,
    pub radius_km: f64,
}

#[derive(Debug, Default)]
struct RestaurantState {
    restaurants: EntityStore<Restaurant>,
    restaurants_request: RequestEnvelope,
    near_by: EntityStore<Restaurant>,
    near_by_request: RequestEnvelope,
}

/// Immutable restaurant view for screens.
#[derive(Debug, Clone)]
pub struct RestaurantSnapshot {
    pub restaurants: Vec<Restaurant>,
    pub restaurants_request: RequestEnvelope,
    pub near_by: Vec<Restaurant>,
    pub near_by_request: RequestEnvelope,
}

impl RestaurantSnapshot {
    /// The list a map/explore view should render: nearby results when the
    /// geo query produced any, the general list otherwise.
    #[must_use]
    pub fn preferred(&self) -> &[Restaurant] {
        if self.near_by.is_empty() {
            &self.restaurants
        } else {
            &self.near_by
        }
    }
}

/// The restaurant slice.
#[derive(Debug)]
pub struct RestaurantStore<T> {
    inner: Arc<RestaurantInner<T>>,
}

impl<T> Clone for RestaurantStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct RestaurantInner<T> {
    transport: Arc<T>,
    state: Mutex<RestaurantState>,
    notifier: ChangeNotifier,
}

impl<T: Transport> RestaurantStore<T> {
    pub(crate) fn new(transport: Arc<T>, notifier: ChangeNotifier) -> Self {
        Self {
            inner: Arc::new(RestaurantInner {
                transport,
                state: Mutex::new(RestaurantState::default()),
                notifier,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RestaurantState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the general restaurant list, optionally radius-scoped.
    ///
    /// Successive calls with different scopes overwrite each other (last
    /// query wins); results from distinct geo queries are never
    /// accumulated.
    #[instrument(skip(self))]
    pub async fn fetch_restaurants(&self, scope: Option<GeoQuery>) {
        let token = {
            let mut state = self.lock();
            state.restaurants_request.begin()
        };
        self.inner.notifier.notify();

        let path = endpoints::restaurants(scope.map(|q| (q.center, q.radius_km)));
        let result = self.inner.transport.request(Method::Get, &path, None).await;

        {
            let mut state = self.lock();
            match result.and_then(normalize::many::<Restaurant>) {
                Ok(restaurants) => {
                    if state.restaurants_request.succeed(token) {
                        state.restaurants.replace_all(restaurants);
                    } else {
                        debug!("stale restaurant list discarded");
                    }
                }
                Err(e) => {
                    if state.restaurants_request.fail(token, e.user_message()) {
                        warn!(error = %e, "restaurant fetch failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
    }

    /// Fetch nearby restaurants for a specific geo query into the separate
    /// `near_by` slot.
    #[instrument(skip(self))]
    pub async fn fetch_nearby(&self, center: GeoPoint) {
        let token = {
            let mut state = self.lock();
            state.near_by_request.begin()
        };
        self.inner.notifier.notify();

        let path = endpoints::restaurants_nearby(center);
        let result = self.inner.transport.request(Method::Get, &path, None).await;

        {
            let mut state = self.lock();
            match result.and_then(normalize::many::<Restaurant>) {
                Ok(restaurants) => {
                    if state.near_by_request.succeed(token) {
                        state.near_by.replace_all(restaurants);
                    } else {
                        debug!("stale nearby response discarded");
                    }
                }
                Err(e) => {
                    if state.near_by_request.fail(token, e.user_message()) {
                        warn!(error = %e, "nearby fetch failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
    }

    /// Current restaurant state.
    #[must_use]
    pub fn snapshot(&self) -> RestaurantSnapshot {
        let state = self.lock();
        RestaurantSnapshot {
            restaurants: state.restaurants.to_vec(),
            restaurants_request: state.restaurants_request.clone(),
            near_by: state.near_by.to_vec(),
            near_by_request: state.near_by_request.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestStatus;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    fn store() -> (RestaurantStore<MockTransport>, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let (notifier, _changes) = ChangeNotifier::new();
        let store = RestaurantStore::new(Arc::clone(&transport), notifier);
        (store, transport)
    }

    fn restaurant(id: &str, lat: f64, lng: f64) -> serde_json::Value {
        json!({
            "id": id,
            "name": id,
            "location": {"lat": lat, "lng": lng}
        })
    }

    #[tokio::test]
    async fn test_last_geo_query_wins() {
        let (store, transport) = store();
        transport.respond_ok("/restaurants?lat=12.9", json!([restaurant("r-1", 12.9, 77.6)]));
        store
            .fetch_restaurants(Some(GeoQuery {
                center: GeoPoint::new(12.9, 77.6),
                radius_km: 5.0,
            }))
            .await;

        transport.respond_ok("/restaurants?lat=13.1", json!([restaurant("r-2", 13.1, 77.7)]));
        store
            .fetch_restaurants(Some(GeoQuery {
                center: GeoPoint::new(13.1, 77.7),
                radius_km: 5.0,
            }))
            .await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.restaurants.len(), 1);
        assert_eq!(
            snapshot.restaurants.first().map(|r| r.id.to_string()),
            Some("r-2".to_owned())
        );
    }

    #[tokio::test]
    async fn test_nearby_is_a_separate_slot_with_precedence() {
        let (store, transport) = store();
        transport.respond_ok("/restaurants", json!([restaurant("r-1", 12.9, 77.6)]));
        store.fetch_restaurants(None).await;

        let snapshot = store.snapshot();
        // No nearby results yet: fall back to the general list.
        assert_eq!(snapshot.preferred().len(), 1);

        transport.respond_ok(
            "/restaurants/nearby",
            json!([restaurant("r-9", 12.91, 77.61)]),
        );
        store.fetch_nearby(GeoPoint::new(12.9, 77.6)).await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.restaurants.len(), 1);
        assert_eq!(snapshot.near_by.len(), 1);
        // Nearby takes precedence once populated - never merged.
        assert_eq!(
            snapshot.preferred().first().map(|r| r.id.to_string()),
            Some("r-9".to_owned())
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_list() {
        let (store, transport) = store();
        transport.respond_ok("/restaurants", json!([restaurant("r-1", 12.9, 77.6)]));
        store.fetch_restaurants(None).await;

        transport.respond_err(
            "/restaurants",
            crate::transport::TransportError::Network("offline".into()),
        );
        store.fetch_restaurants(None).await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.restaurants.len(), 1);
        assert_eq!(snapshot.restaurants_request.status(), RequestStatus::Failed);
    }

    #[test]
    fn test_distance_label_computed_at_read_time() {
        let here = GeoPoint::new(12.9716, 77.5946);
        let r: Restaurant = serde_json::from_value(restaurant("r-1", 12.9736, 77.5946))
            .expect("deserialize");
        let label = r.distance_label(here);
        assert!(label.ends_with(" m"), "expected metres, got {label}");
    }
}
