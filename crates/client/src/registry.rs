//! Store wiring and the coarse change signal.
//!
//! [`AppStores`] owns one instance of every slice, wired to a shared
//! transport and a shared [`RequestContext`]. UI shells subscribe to a
//! single [`watch`] channel and re-snapshot whatever slices they render
//! when it ticks; the channel carries a counter, not state, so a slow
//! subscriber only ever misses intermediate ticks, never the latest one.
//!
//! Cross-store flows (checkout clearing the cart, the best-effort cart
//! mirror) live here too, so the slices themselves stay independent.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::config::ApiConfig;
use crate::endpoints;
use crate::error::ValidationError;
use crate::location::LocationProvider;
use crate::storage::TokenStore;
use crate::stores::restaurants::GeoQuery;
use crate::stores::toast::NotificationBus;
use crate::stores::{
    AddressStore, AuthStore, CartStore, CatalogStore, OrderStore, RestaurantStore,
};
use crate::transport::rest::RestTransport;
use crate::transport::{Method, RequestContext, Transport, TransportError};
use crate::types::{CartLine, CheckoutPayload};
use tiffin_core::AddressId;

/// Broadcasts "something changed, re-snapshot" to UI subscribers.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: watch::Sender<u64>,
}

impl ChangeNotifier {
    /// Create a notifier plus the receiver UI shells subscribe with.
    #[must_use]
    pub fn new() -> (Self, watch::Receiver<u64>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx }, rx)
    }

    /// Signal a state change. Coalesces under load; subscribers observe at
    /// least the final tick.
    pub fn notify(&self) {
        self.tx.send_modify(|tick| *tick = tick.wrapping_add(1));
    }

    /// A fresh receiver for an additional subscriber.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

/// Every store slice, wired and ready.
#[derive(Debug)]
pub struct AppStores<T, S> {
    transport: Arc<T>,
    notifier: ChangeNotifier,
    notices: NotificationBus,
    cart: CartStore,
    catalog: CatalogStore<T>,
    restaurants: RestaurantStore<T>,
    orders: OrderStore<T>,
    addresses: AddressStore<T>,
    auth: AuthStore<T, S>,
}

impl<S: TokenStore> AppStores<RestTransport, S> {
    /// Wire the full store set against the real backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(config: ApiConfig, tokens: S) -> Result<Self, TransportError> {
        let context = RequestContext::new();
        let transport = Arc::new(RestTransport::new(config, context.clone())?);
        Ok(Self::wire(transport, context, tokens))
    }
}

impl<T: Transport, S: TokenStore> AppStores<T, S> {
    /// Wire the store set against an arbitrary transport. Tests use this
    /// with a scripted mock.
    #[must_use]
    pub fn with_transport(transport: Arc<T>, tokens: S) -> Self {
        Self::wire(transport, RequestContext::new(), tokens)
    }

    fn wire(transport: Arc<T>, context: RequestContext, tokens: S) -> Self {
        let (notifier, _initial) = ChangeNotifier::new();
        let notices = NotificationBus::new(notifier.clone());
        Self {
            cart: CartStore::new(notifier.clone()),
            catalog: CatalogStore::new(Arc::clone(&transport), context.clone(), notifier.clone()),
            restaurants: RestaurantStore::new(Arc::clone(&transport), notifier.clone()),
            orders: OrderStore::new(Arc::clone(&transport), notices.clone(), notifier.clone()),
            addresses: AddressStore::new(Arc::clone(&transport), notices.clone(), notifier.clone()),
            auth: AuthStore::new(
                Arc::clone(&transport),
                tokens,
                context,
                notices.clone(),
                notifier.clone(),
            ),
            transport,
            notifier,
            notices,
        }
    }

    /// Receiver that ticks whenever any slice changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notifier.subscribe()
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogStore<T> {
        &self.catalog
    }

    #[must_use]
    pub fn restaurants(&self) -> &RestaurantStore<T> {
        &self.restaurants
    }

    #[must_use]
    pub fn orders(&self) -> &OrderStore<T> {
        &self.orders
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressStore<T> {
        &self.addresses
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore<T, S> {
        &self.auth
    }

    #[must_use]
    pub fn notices(&self) -> &NotificationBus {
        &self.notices
    }

    /// Add a line to the local cart and mirror it to the server in the
    /// background.
    ///
    /// The cart is authoritative locally; the mirror is best effort and its
    /// failure is invisible to the user (the checkout payload carries the
    /// real cart anyway).
    pub fn add_to_cart(&self, line: CartLine) {
        self.cart.add_or_increment(line.clone());

        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let body = serde_json::to_value(&line).unwrap_or(serde_json::Value::Null);
            if let Err(e) = transport
                .request(Method::Post, endpoints::CART_ADD, Some(body))
                .await
            {
                debug!(error = %e, "cart mirror failed");
            }
        });
    }

    /// Refresh the restaurant list using the device position when the
    /// provider yields one, falling back to the unscoped list.
    #[instrument(skip(self, location))]
    pub async fn refresh_restaurants<L: LocationProvider>(&self, location: &L, radius_km: f64) {
        let scope = location
            .current_position()
            .await
            .map(|center| GeoQuery { center, radius_km });
        self.restaurants.fetch_restaurants(scope).await;
    }

    /// Check out the current cart to `address_id`.
    ///
    /// The cart is cleared only after the server accepts the order; a
    /// failed checkout leaves it intact for retry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty cart or missing address.
    #[instrument(skip(self))]
    pub async fn checkout(&self, address_id: AddressId) -> Result<(), ValidationError> {
        let snapshot = self.cart.snapshot();
        let payload = CheckoutPayload::from_cart(&snapshot.lines, address_id);
        self.orders.create_order(payload).await?;

        let created = self.orders.snapshot().create_request.status()
            == crate::request::RequestStatus::Succeeded;
        if created {
            self.cart.clear();
        }
        Ok(())
    }
}
