//! Saved delivery addresses.
//!
//! The address book is small and never paginated; fetches always replace
//! the whole list. Some backends echo the created address, others echo the
//! full updated book, so `add_address` accepts either shape.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};

use crate::endpoints;
use crate::entity::EntityStore;
use crate::normalize;
use crate::registry::ChangeNotifier;
use crate::request::RequestEnvelope;
use crate::stores::toast::{NotificationBus, ToastKind};
use crate::transport::{Method, Transport};
use crate::types::{Address, NewAddress};

#[derive(Debug, Default)]
struct AddressState {
    addresses: EntityStore<Address>,
    list_request: RequestEnvelope,
    save_request: RequestEnvelope,
}

/// Immutable address-book view for screens.
#[derive(Debug, Clone)]
pub struct AddressSnapshot {
    pub addresses: Vec<Address>,
    pub list_request: RequestEnvelope,
    pub save_request: RequestEnvelope,
}

/// The address-book slice.
#[derive(Debug)]
pub struct AddressStore<T> {
    inner: Arc<AddressInner<T>>,
}

impl<T> Clone for AddressStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct AddressInner<T> {
    transport: Arc<T>,
    state: Mutex<AddressState>,
    notices: NotificationBus,
    notifier: ChangeNotifier,
}

impl<T: Transport> AddressStore<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        notices: NotificationBus,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            inner: Arc::new(AddressInner {
                transport,
                state: Mutex::new(AddressState::default()),
                notices,
                notifier,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AddressState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the full address book, replacing the current list.
    #[instrument(skip(self))]
    pub async fn fetch_addresses(&self) {
        let token = {
            let mut state = self.lock();
            if state.list_request.is_pending() {
                debug!("address fetch already pending");
                return;
            }
            state.list_request.begin()
        };
        self.inner.notifier.notify();

        let result = self
            .inner
            .transport
            .request(Method::Get, endpoints::ADDRESSES, None)
            .await;

        {
            let mut state = self.lock();
            match result.and_then(normalize::many::<Address>) {
                Ok(addresses) => {
                    if state.list_request.succeed(token) {
                        state.addresses.replace_all(addresses);
                    } else {
                        debug!("stale address list discarded");
                    }
                }
                Err(e) => {
                    if state.list_request.fail(token, e.user_message()) {
                        warn!(error = %e, "address fetch failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
    }

    /// Save a new address.
    ///
    /// The response may be the created address, the full updated book, or
    /// empty; created addresses are upserted, a full book replaces the
    /// list. Failures raise an error toast and keep the book unchanged.
    #[instrument(skip(self, address))]
    pub async fn add_address(&self, address: NewAddress) {
        let token = {
            let mut state = self.lock();
            if state.save_request.is_pending() {
                debug!("address save already in flight");
                return;
            }
            state.save_request.begin()
        };
        self.inner.notifier.notify();

        let body = serde_json::to_value(&address).unwrap_or(serde_json::Value::Null);
        let result = self
            .inner
            .transport
            .request(Method::Post, endpoints::ADDRESSES, Some(body))
            .await;

        let toast_error = {
            let mut state = self.lock();
            match result.map(normalize::unwrap_data) {
                Ok(value) => {
                    if state.save_request.succeed(token) {
                        apply_save_response(&mut state.addresses, value);
                    }
                    None
                }
                Err(e) => {
                    let message = e.user_message();
                    if state.save_request.fail(token, message.clone()) {
                        warn!(error = %e, "address save failed");
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
    }

    /// Current address-book state.
    #[must_use]
    pub fn snapshot(&self) -> AddressSnapshot {
        let state = self.lock();
        AddressSnapshot {
            addresses: state.addresses.to_vec(),
            list_request: state.list_request.clone(),
            save_request: state.save_request.clone(),
        }
    }
}

fn apply_save_response(book: &mut EntityStore<Address>, value: serde_json::Value) {
    match value {
        serde_json::Value::Array(_) => match serde_json::from_value::<Vec<Address>>(value) {
            Ok(addresses) => book.replace_all(addresses),
            Err(e) => warn!(error = %e, "unreadable address list in save response"),
        },
        serde_json::Value::Object(_) => match serde_json::from_value::<Address>(value) {
            Ok(address) => {
                book.upsert(address);
            }
            Err(e) => warn!(error = %e, "unreadable address in save response"),
        },
        // An empty ack: the caller refetches when it needs the server id.
        _ => debug!("address save response carried no address"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestStatus;
    use crate::transport::TransportError;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    fn store() -> (AddressStore<MockTransport>, Arc<MockTransport>, NotificationBus) {
        let transport = Arc::new(MockTransport::new());
        let (notifier, _changes) = ChangeNotifier::new();
        let notices = NotificationBus::new(notifier.clone());
        let store = AddressStore::new(Arc::clone(&transport), notices.clone(), notifier);
        (store, transport, notices)
    }

    fn address(id: &str) -> serde_json::Value {
        json!({"id": id, "street": "12 MG Road", "city": "Bengaluru"})
    }

    fn new_address() -> NewAddress {
        NewAddress {
            label: Some("Home".into()),
            street: "12 MG Road".into(),
            city: "Bengaluru".into(),
            postal_code: Some("560001".into()),
            location: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_replaces_address_book() {
        let (store, transport, _notices) = store();
        transport.respond_ok("/addresses", json!({"data": [address("a-1"), address("a-2")]}));
        store.fetch_addresses().await;
        assert_eq!(store.snapshot().addresses.len(), 2);

        transport.respond_ok("/addresses", json!({"data": [address("a-3")]}));
        store.fetch_addresses().await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.addresses.len(), 1);
        assert_eq!(
            snapshot.addresses.first().map(|a| a.id.to_string()),
            Some("a-3".to_owned())
        );
    }

    #[tokio::test]
    async fn test_add_address_accepts_single_object_response() {
        let (store, transport, _notices) = store();
        transport.respond_to(Method::Post, "/addresses", Ok(json!({"data": address("a-1")})));
        store.add_address(new_address()).await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.addresses.len(), 1);
        assert_eq!(snapshot.save_request.status(), RequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_add_address_accepts_full_book_response() {
        let (store, transport, _notices) = store();
        transport.respond_ok("/addresses", json!({"data": [address("a-1")]}));
        store.fetch_addresses().await;

        transport.respond_to(
            Method::Post,
            "/addresses",
            Ok(json!({"data": [address("a-1"), address("a-2")]})),
        );
        store.add_address(new_address()).await;

        assert_eq!(store.snapshot().addresses.len(), 2);
    }

    #[tokio::test]
    async fn test_add_address_empty_ack_keeps_book() {
        let (store, transport, _notices) = store();
        transport.respond_to(Method::Post, "/addresses", Ok(serde_json::Value::Null));
        store.add_address(new_address()).await;

        let snapshot = store.snapshot();
        assert!(snapshot.addresses.is_empty());
        assert_eq!(snapshot.save_request.status(), RequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_failed_save_raises_toast() {
        let (store, transport, notices) = store();
        transport.respond_err(
            "/addresses",
            TransportError::Status {
                status: 400,
                message: "Pincode not serviceable".into(),
            },
        );
        store.add_address(new_address()).await;

        let snapshot = store.snapshot();
        assert!(snapshot.addresses.is_empty());
        assert_eq!(snapshot.save_request.status(), RequestStatus::Failed);
        assert_eq!(
            notices.current().map(|t| t.message),
            Some("Pincode not serviceable".to_owned())
        );
    }
}
