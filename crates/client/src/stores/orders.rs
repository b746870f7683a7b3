//! Order slice: paginated history, checkout, and the single detail slot.
//!
//! Three independent envelopes (list, detail, create) so the screens can
//! distinguish "history loading" from "checkout in flight" from "detail
//! loading". A successful checkout prepends the returned order onto the
//! front of the list (most-recent-first) instead of refetching it. The
//! detail slot must be cleared when navigation leaves the detail screen,
//! otherwise order A's detail bleeds into order B's screen while B's fetch
//! is still in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};

use tiffin_core::OrderId;

use crate::endpoints;
use crate::entity::EntityStore;
use crate::error::ValidationError;
use crate::normalize::{self, PageInfo};
use crate::registry::ChangeNotifier;
use crate::request::RequestEnvelope;
use crate::stores::toast::{NotificationBus, ToastKind};
use crate::transport::{Method, Transport};
use crate::types::{CheckoutPayload, Order};

#[derive(Debug, Default)]
struct OrderState {
    orders: EntityStore<Order>,
    pagination: PageInfo,
    list_request: RequestEnvelope,
    details: Option<Order>,
    details_request: RequestEnvelope,
    create_request: RequestEnvelope,
}

/// Immutable order view for screens.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    /// Most-recent-first order history.
    pub orders: Vec<Order>,
    pub pagination: PageInfo,
    pub list_request: RequestEnvelope,
    /// The single current-detail slot.
    pub details: Option<Order>,
    pub details_request: RequestEnvelope,
    pub create_request: RequestEnvelope,
}

/// The order slice.
#[derive(Debug)]
pub struct OrderStore<T> {
    inner: Arc<OrderInner<T>>,
}

impl<T> Clone for OrderStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct OrderInner<T> {
    transport: Arc<T>,
    state: Mutex<OrderState>,
    notices: NotificationBus,
    notifier: ChangeNotifier,
}

impl<T: Transport> OrderStore<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        notices: NotificationBus,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            inner: Arc::new(OrderInner {
                transport,
                state: Mutex::new(OrderState::default()),
                notices,
                notifier,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OrderState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch one page of order history.
    ///
    /// Page 1 replaces, later pages append with duplicate-id suppression; a
    /// pending fetch makes this a no-op.
    #[instrument(skip(self))]
    pub async fn fetch_orders(&self, page: u32, limit: u32) {
        let token = {
            let mut state = self.lock();
            if state.list_request.is_pending() {
                debug!("order list fetch already pending");
                return;
            }
            if page > 1 && !state.pagination.has_next_page {
                debug!("no next page to fetch");
                return;
            }
            state.list_request.begin()
        };
        self.inner.notifier.notify();

        let path = endpoints::orders(page, limit);
        let result = self.inner.transport.request(Method::Get, &path, None).await;

        {
            let mut state = self.lock();
            match result.and_then(normalize::paginated::<Order>) {
                Ok(fetched) => {
                    if state.list_request.succeed(token) {
                        if page <= 1 {
                            state.orders.replace_all(fetched.items);
                        } else {
                            state.orders.append_dedup(fetched.items);
                        }
                        let mut info = fetched.info;
                        if info.current_page == 0 {
                            info.current_page = page;
                        }
                        state.pagination = info;
                    } else {
                        debug!("stale order page discarded");
                    }
                }
                Err(e) => {
                    if state.list_request.fail(token, e.user_message()) {
                        warn!(error = %e, "order list fetch failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
    }

    /// Fetch a single order into the detail slot.
    ///
    /// Failure leaves the slot as it was (usually `None` after
    /// [`clear_order_details`](Self::clear_order_details)); the screens
    /// distinguish loading / error / empty via the envelope, never by
    /// overloading the slot itself.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn fetch_order_details(&self, id: &OrderId) {
        let token = {
            let mut state = self.lock();
            state.details_request.begin()
        };
        self.inner.notifier.notify();

        let path = endpoints::order_detail(id);
        let result = self.inner.transport.request(Method::Get, &path, None).await;

        {
            let mut state = self.lock();
            match result.and_then(normalize::one::<Order>) {
                Ok(order) => {
                    if state.details_request.succeed(token) {
                        state.details = Some(order);
                    } else {
                        debug!("stale order detail discarded");
                    }
                }
                Err(e) => {
                    if state.details_request.fail(token, e.user_message()) {
                        warn!(error = %e, "order detail fetch failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
    }

    /// Create an order from a checkout payload.
    ///
    /// Local validation failures return synchronously; transport failures
    /// are folded into the create envelope and surfaced as a toast. On
    /// success the returned order (if the server echoes one) is prepended
    /// onto the history. A checkout already in flight makes this a no-op
    /// (double-tap guard).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the payload has no items or no
    /// delivery address; nothing is sent in that case.
    #[instrument(skip(self, payload))]
    pub async fn create_order(&self, payload: CheckoutPayload) -> Result<(), ValidationError> {
        if payload.items.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        if payload.address_id.as_str().is_empty() {
            return Err(ValidationError::MissingAddress);
        }

        let token = {
            let mut state = self.lock();
            if state.create_request.is_pending() {
                debug!("checkout already in flight");
                return Ok(());
            }
            state.create_request.begin()
        };
        self.inner.notifier.notify();

        let body = serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null);
        let result = self
            .inner
            .transport
            .request(Method::Post, endpoints::ORDERS, Some(body))
            .await;

        let toast_error = {
            let mut state = self.lock();
            match result {
                Ok(value) => {
                    if state.create_request.succeed(token) {
                        match extract_created_order(value) {
                            Some(order) => state.orders.prepend(order),
                            None => debug!("order create response carried no order"),
                        }
                    }
                    None
                }
                Err(e) => {
                    let message = e.user_message();
                    if state.create_request.fail(token, message.clone()) {
                        warn!(error = %e, "order creation failed");
                        Some(message)
                    } else {
                        None
                    }
                }
            }
        };
        if let Some(message) = toast_error {
            self.inner.notices.show(message, ToastKind::Error);
        }
        self.inner.notifier.notify();
        Ok(())
    }

    /// Clear the detail slot. Must be called when navigation leaves the
    /// detail screen.
    pub fn clear_order_details(&self) {
        {
            let mut state = self.lock();
            state.details = None;
            state.details_request.reset();
        }
        self.inner.notifier.notify();
    }

    /// Current order state.
    #[must_use]
    pub fn snapshot(&self) -> OrderSnapshot {
        let state = self.lock();
        OrderSnapshot {
            orders: state.orders.to_vec(),
            pagination: state.pagination,
            list_request: state.list_request.clone(),
            details: state.details.clone(),
            details_request: state.details_request.clone(),
            create_request: state.create_request.clone(),
        }
    }
}

/// Pull the created order out of a checkout response, if the server
/// returned one.
fn extract_created_order(value: serde_json::Value) -> Option<Order> {
    let value = normalize::unwrap_data(value);
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestStatus;
    use crate::transport::TransportError;
    use crate::transport::mock::MockTransport;
    use serde_json::json;
    use tiffin_core::AddressId;

    fn store() -> (OrderStore<MockTransport>, Arc<MockTransport>, NotificationBus) {
        let transport = Arc::new(MockTransport::new());
        let (notifier, _changes) = ChangeNotifier::new();
        let notices = NotificationBus::new(notifier.clone());
        let store = OrderStore::new(Arc::clone(&transport), notices.clone(), notifier);
        (store, transport, notices)
    }

    fn order(id: &str) -> serde_json::Value {
        json!({"id": id, "orderId": format!("TIF-{id}"), "status": "pending"})
    }

    fn payload() -> CheckoutPayload {
        CheckoutPayload {
            items: vec![crate::types::CheckoutItem {
                product_id: tiffin_core::ProductId::new("p-1"),
                quantity: 1,
            }],
            address_id: AddressId::new("a-1"),
            restaurant_id: None,
            note: None,
        }
    }

    fn order_ids(store: &OrderStore<MockTransport>) -> Vec<String> {
        store
            .snapshot()
            .orders
            .iter()
            .map(|o| o.id.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_created_order_is_prepended() {
        let (store, transport, _notices) = store();
        transport.respond_ok(
            "/orders?page=1",
            json!({"data": {"orders": [order("o-2"), order("o-1")]}}),
        );
        store.fetch_orders(1, 10).await;

        transport.respond_ok("/orders", json!({"data": order("o-3")}));
        store.create_order(payload()).await.expect("valid payload");

        assert_eq!(order_ids(&store), vec!["o-3", "o-2", "o-1"]);
        // Prepend, not refetch: exactly two requests total.
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_checkout_validation_is_synchronous() {
        let (store, transport, _notices) = store();

        let empty = CheckoutPayload {
            items: vec![],
            address_id: AddressId::new("a-1"),
            restaurant_id: None,
            note: None,
        };
        assert_eq!(
            store.create_order(empty).await,
            Err(ValidationError::EmptyCart)
        );

        let no_address = CheckoutPayload {
            address_id: AddressId::new(""),
            ..payload()
        };
        assert_eq!(
            store.create_order(no_address).await,
            Err(ValidationError::MissingAddress)
        );

        // Neither attempt reached the network or touched the envelope.
        assert!(transport.requests().is_empty());
        assert_eq!(
            store.snapshot().create_request.status(),
            RequestStatus::Idle
        );
    }

    #[tokio::test]
    async fn test_failed_checkout_raises_toast_and_keeps_orders() {
        let (store, transport, notices) = store();
        transport.respond_ok("/orders?page=1", json!({"data": {"orders": [order("o-1")]}}));
        store.fetch_orders(1, 10).await;

        transport.respond_err(
            "/orders",
            TransportError::Status {
                status: 422,
                message: "Restaurant is closed".into(),
            },
        );
        store.create_order(payload()).await.expect("valid payload");

        assert_eq!(order_ids(&store), vec!["o-1"]);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.create_request.status(), RequestStatus::Failed);
        assert_eq!(snapshot.create_request.error(), Some("Restaurant is closed"));

        let toast = notices.current().expect("toast raised");
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Restaurant is closed");
    }

    #[tokio::test]
    async fn test_detail_isolation_after_clear() {
        let (store, transport, _notices) = store();
        transport.respond_ok("/orders/o-1", json!({"data": order("o-1")}));
        store.fetch_order_details(&OrderId::new("o-1")).await;
        assert!(store.snapshot().details.is_some());

        // Leave the detail screen, then open order X whose fetch fails.
        store.clear_order_details();
        transport.respond_err(
            "/orders/o-x",
            TransportError::Status {
                status: 404,
                message: "Order not found".into(),
            },
        );
        store.fetch_order_details(&OrderId::new("o-x")).await;

        let snapshot = store.snapshot();
        // The failed fetch must not resurrect order o-1's detail.
        assert!(snapshot.details.is_none());
        assert_eq!(snapshot.details_request.status(), RequestStatus::Failed);
    }

    #[tokio::test]
    async fn test_order_pagination_appends_with_dedup() {
        let (store, transport, _notices) = store();
        transport.respond_ok(
            "/orders?page=1",
            json!({"data": {
                "orders": [order("o-3"), order("o-2")],
                "pagination": {"currentPage": 1, "totalPages": 2, "totalItems": 3, "hasNextPage": true}
            }}),
        );
        store.fetch_orders(1, 2).await;

        transport.respond_ok(
            "/orders?page=2",
            json!({"data": {
                "orders": [order("o-2"), order("o-1")],
                "pagination": {"currentPage": 2, "totalPages": 2, "totalItems": 3, "hasNextPage": false}
            }}),
        );
        store.fetch_orders(2, 2).await;

        assert_eq!(order_ids(&store), vec!["o-3", "o-2", "o-1"]);
    }
}
