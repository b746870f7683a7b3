//! End-to-end tests for the Tiffin client state core.
//!
//! Every test drives the fully wired [`AppStores`] registry over a scripted
//! mock transport, exactly as a UI shell would: issue intents, await them,
//! re-read snapshots. Nothing here reaches a real network.
//!
//! The `tests/` directory splits by flow: `ordering` covers
//! browse-cart-checkout, `session` covers the OTP lifecycle, `feedback`
//! covers toast surfacing.

use std::sync::Arc;

use serde_json::{Value, json};

use tiffin_client::registry::AppStores;
use tiffin_client::storage::MemoryTokenStore;
use tiffin_client::transport::mock::MockTransport;

/// A wired store registry plus a handle to its scripted transport.
pub struct Harness {
    pub stores: AppStores<MockTransport, MemoryTokenStore>,
    pub transport: Arc<MockTransport>,
}

impl Harness {
    /// Fresh registry over an unscripted transport and an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tokens(MemoryTokenStore::new())
    }

    /// Fresh registry with a pre-seeded token store, as if a previous
    /// session signed in.
    #[must_use]
    pub fn with_tokens(tokens: MemoryTokenStore) -> Self {
        let transport = Arc::new(MockTransport::new());
        let stores = AppStores::with_transport(Arc::clone(&transport), tokens);
        Self { stores, transport }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Product payload as the catalog endpoint returns it.
#[must_use]
pub fn product_json(id: &str, name: &str, price: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "image": format!("https://cdn.tiffin.app/{id}.jpg"),
        "type": "veg"
    })
}

/// One paginated product page in the backend's wire shape.
#[must_use]
pub fn product_page(products: Vec<Value>, page: u32, total_pages: u32) -> Value {
    let total = products.len();
    json!({"data": {
        "products": products,
        "pagination": {
            "currentPage": page,
            "totalPages": total_pages,
            "totalItems": total,
            "hasNextPage": page < total_pages
        }
    }})
}

/// Order payload as the orders endpoint returns it.
#[must_use]
pub fn order_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "orderId": format!("TIF-{id}"),
        "status": status,
        "totalAmount": "300",
        "grandTotal": "330"
    })
}

/// A verified-session payload for the OTP verify endpoint.
#[must_use]
pub fn session_json(token: &str, phone: &str) -> Value {
    json!({"data": {
        "token": token,
        "user": {"id": "u-1", "phone": phone, "name": "Asha"}
    }})
}
