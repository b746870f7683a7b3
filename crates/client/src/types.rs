//! Domain types for the Tiffin REST API.
//!
//! These types provide a clean, ergonomic surface separate from the raw JSON
//! payloads; `serde` aliases absorb the backend's camelCase naming and its
//! occasional inconsistencies, so the stores only ever see these shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tiffin_core::{
    AddressId, CategoryId, DietType, GeoPoint, Money, OrderId, OrderStatus, ProductId,
    RestaurantId, UserId, format_distance, haversine_km,
};

use crate::entity::Keyed;

// =============================================================================
// Cart
// =============================================================================

/// One product line in the local cart.
///
/// Unique per product id; quantity is always at least 1 (a line reduced to
/// zero is removed, never kept).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product this line refers to.
    pub id: ProductId,
    /// Display title, denormalized from the product at add time.
    pub title: String,
    /// Unit price at add time.
    pub price: Money,
    /// Line quantity, `>= 1`.
    pub quantity: u32,
    /// Product image URL.
    pub image: String,
    /// Restaurant the product belongs to, when known.
    #[serde(default)]
    pub restaurant_id: Option<RestaurantId>,
}

impl CartLine {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

impl Keyed for CartLine {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.id.clone()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A food category, shared across all facets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, alias = "is_vegetarian")]
    pub is_vegetarian: bool,
    #[serde(default, alias = "highProtein")]
    pub is_high_protein: Option<bool>,
    #[serde(default, alias = "quickDelivery")]
    pub is_quick_delivery: Option<bool>,
}

impl Keyed for Category {
    type Key = CategoryId;

    fn key(&self) -> CategoryId {
        self.id.clone()
    }
}

/// A product inside a paginated catalog result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, alias = "category")]
    pub category_id: Option<CategoryId>,
    #[serde(default, alias = "restaurant")]
    pub restaurant_id: Option<RestaurantId>,
    /// Dietary type; the wire field is `type`.
    #[serde(rename = "type", default = "default_diet")]
    pub diet: DietType,
}

const fn default_diet() -> DietType {
    DietType::Veg
}

impl Product {
    /// Build a cart line for this product with the given quantity.
    #[must_use]
    pub fn to_cart_line(&self, quantity: u32) -> CartLine {
        CartLine {
            id: self.id.clone(),
            title: self.name.clone(),
            price: self.price,
            quantity: quantity.max(1),
            image: self.image.clone().unwrap_or_default(),
            restaurant_id: self.restaurant_id.clone(),
        }
    }
}

impl Keyed for Product {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.id.clone()
    }
}

// =============================================================================
// Restaurants
// =============================================================================

/// Aggregate rating for a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rating {
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub count: u32,
}

/// A restaurant as returned by the list and nearby endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default, alias = "cuisines")]
    pub cuisine_type: Vec<String>,
    #[serde(default)]
    pub address: String,
    pub location: GeoPoint,
}

impl Restaurant {
    /// Human-readable distance from `from`, computed at read time.
    #[must_use]
    pub fn distance_label(&self, from: GeoPoint) -> String {
        format_distance(haversine_km(from, self.location))
    }
}

impl Keyed for Restaurant {
    type Key = RestaurantId;

    fn key(&self) -> RestaurantId {
        self.id.clone()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A denormalized line inside an order, as confirmed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "productId")]
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
}

/// Denormalized restaurant snapshot embedded in an order payload.
///
/// Orders never join against the restaurant store at read time; whatever the
/// server embedded at creation is what the screens show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSnapshot {
    pub id: RestaurantId,
    pub name: String,
}

/// An order, server-assigned id and all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Internal id used for detail fetches.
    #[serde(alias = "_id")]
    pub id: OrderId,
    /// Human-facing order number shown on receipts.
    #[serde(default, alias = "orderId")]
    pub order_number: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub grand_total: Money,
    #[serde(default)]
    pub restaurant: Option<RestaurantSnapshot>,
    #[serde(default)]
    pub delivery_address: Option<Address>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Keyed for Order {
    type Key = OrderId;

    fn key(&self) -> OrderId {
        self.id.clone()
    }
}

/// Checkout request body for `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub items: Vec<CheckoutItem>,
    pub address_id: AddressId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<RestaurantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One line of a checkout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CheckoutPayload {
    /// Build a checkout payload from the local cart lines.
    ///
    /// The restaurant is taken from the first line carrying one; mixed-
    /// restaurant carts are a server-side concern.
    #[must_use]
    pub fn from_cart(lines: &[CartLine], address_id: AddressId) -> Self {
        Self {
            items: lines
                .iter()
                .map(|line| CheckoutItem {
                    product_id: line.id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            address_id,
            restaurant_id: lines.iter().find_map(|line| line.restaurant_id.clone()),
            note: None,
        }
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// A saved delivery address. Ids are always server-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(alias = "_id")]
    pub id: AddressId,
    /// Short label such as "Home" or "Work".
    #[serde(default)]
    pub label: Option<String>,
    pub street: String,
    pub city: String,
    #[serde(default, alias = "pincode")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl Keyed for Address {
    type Key = AddressId;

    fn key(&self) -> AddressId {
        self.id.clone()
    }
}

/// Request body for `POST /addresses`; the server assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

// =============================================================================
// Auth / Profile
// =============================================================================

/// The signed-in user's profile projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl UserProfile {
    /// Merge-patch fields the server confirmed changed.
    ///
    /// Only keys present in `patch` are applied; fields the partial response
    /// omits keep their current values.
    pub fn merge_from(&mut self, patch: &serde_json::Value) {
        let Some(map) = patch.as_object() else {
            return;
        };
        if let Some(phone) = map.get("phone").and_then(serde_json::Value::as_str) {
            self.phone = phone.to_owned();
        }
        if let Some(name) = map.get("name").and_then(serde_json::Value::as_str) {
            self.name = Some(name.to_owned());
        }
        if let Some(email) = map.get("email").and_then(serde_json::Value::as_str) {
            self.email = Some(email.to_owned());
        }
        if let Some(image) = map.get("image").and_then(serde_json::Value::as_str) {
            self.image = Some(image.to_owned());
        }
    }
}

/// Partial profile update sent to `PUT /user/profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Successful OTP verification response: session token plus user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedSession {
    #[serde(alias = "accessToken")]
    pub token: String,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_diet_from_type_field() {
        let product: Product = serde_json::from_value(json!({
            "id": "p-1",
            "name": "Paneer Bowl",
            "price": "180",
            "type": "non-veg"
        }))
        .expect("deserialize");
        assert_eq!(product.diet, DietType::NonVeg);
        assert!(product.category_id.is_none());
    }

    #[test]
    fn test_order_accepts_mongo_style_id_alias() {
        let order: Order = serde_json::from_value(json!({
            "_id": "ord-9",
            "orderId": "TIF-1042",
            "status": "preparing",
            "items": [{"id": "p-1", "name": "Dal", "price": "60", "quantity": 2}]
        }))
        .expect("deserialize");
        assert_eq!(order.id, OrderId::new("ord-9"));
        assert_eq!(order.order_number.as_deref(), Some("TIF-1042"));
        assert_eq!(order.status, OrderStatus::Preparing);
    }

    #[test]
    fn test_profile_merge_patch_preserves_omitted_fields() {
        let mut profile = UserProfile {
            id: UserId::new("u-1"),
            phone: "+911234567890".into(),
            name: Some("Asha".into()),
            email: Some("asha@example.com".into()),
            image: None,
        };
        profile.merge_from(&json!({"name": "Asha R"}));

        assert_eq!(profile.name.as_deref(), Some("Asha R"));
        assert_eq!(profile.email.as_deref(), Some("asha@example.com"));
        assert_eq!(profile.phone, "+911234567890");
    }

    #[test]
    fn test_checkout_payload_from_cart() {
        let lines = vec![
            CartLine {
                id: ProductId::new("p-1"),
                title: "Idli".into(),
                price: Money::from_units(40),
                quantity: 2,
                image: String::new(),
                restaurant_id: None,
            },
            CartLine {
                id: ProductId::new("p-2"),
                title: "Dosa".into(),
                price: Money::from_units(70),
                quantity: 1,
                image: String::new(),
                restaurant_id: Some(RestaurantId::new("r-5")),
            },
        ];
        let payload = CheckoutPayload::from_cart(&lines, AddressId::new("a-1"));

        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.restaurant_id, Some(RestaurantId::new("r-5")));
    }
}
