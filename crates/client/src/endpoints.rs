//! Endpoint path templates for the Tiffin backend.
//!
//! The path surface is a fixed contract with the backend; keeping every
//! template in one module means a route change touches exactly one file.
//! Query strings are built here too, with user-supplied values encoded.

use tiffin_core::{CategoryFacet, CategoryId, GeoPoint, OrderId};

/// `POST` - request an OTP for a phone number.
pub const OTP_SEND: &str = "/auth/otp";
/// `POST` - verify an OTP and open a session.
pub const OTP_VERIFY: &str = "/auth/otp/verify";
/// `GET` / `PUT` - the signed-in user's profile.
pub const PROFILE: &str = "/user/profile";
/// `GET` / `POST` - saved delivery addresses.
pub const ADDRESSES: &str = "/addresses";
/// `POST` - create an order from the cart.
pub const ORDERS: &str = "/orders";
/// `POST` - best-effort server-side mirror of a local cart add.
pub const CART_ADD: &str = "/cart/add";

/// Category list for a facet.
#[must_use]
pub fn categories(facet: CategoryFacet) -> String {
    match facet.query_flag() {
        Some(flag) => format!("/categories?{flag}"),
        None => "/categories".to_owned(),
    }
}

/// Paginated, filterable, searchable product list.
#[must_use]
pub fn products(
    page: u32,
    limit: u32,
    category: Option<&CategoryId>,
    search: Option<&str>,
) -> String {
    let mut path = format!("/products?page={page}&limit={limit}");
    if let Some(category) = category {
        path.push_str("&categoryId=");
        path.push_str(&urlencoding::encode(category.as_str()));
    }
    if let Some(search) = search {
        path.push_str("&search=");
        path.push_str(&urlencoding::encode(search));
    }
    path
}

/// Restaurant list, optionally radius-scoped.
#[must_use]
pub fn restaurants(scope: Option<(GeoPoint, f64)>) -> String {
    match scope {
        Some((center, radius_km)) => format!(
            "/restaurants?lat={}&lng={}&radius={radius_km}",
            center.lat, center.lng
        ),
        None => "/restaurants".to_owned(),
    }
}

/// Nearby restaurants for a specific geo query.
#[must_use]
pub fn restaurants_nearby(center: GeoPoint) -> String {
    format!("/restaurants/nearby?lat={}&lng={}", center.lat, center.lng)
}

/// Paginated order list.
#[must_use]
pub fn orders(page: u32, limit: u32) -> String {
    format!("/orders?page={page}&limit={limit}")
}

/// Single order detail.
#[must_use]
pub fn order_detail(id: &OrderId) -> String {
    format!("/orders/{}", urlencoding::encode(id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_encodes_search_terms() {
        let path = products(2, 20, Some(&CategoryId::new("c 1")), Some("masala dosa"));
        assert_eq!(path, "/products?page=2&limit=20&categoryId=c%201&search=masala%20dosa");
    }

    #[test]
    fn test_categories_facet_flags() {
        assert_eq!(categories(CategoryFacet::Plain), "/categories");
        assert_eq!(
            categories(CategoryFacet::HighProtein),
            "/categories?highProtein=true"
        );
        assert_eq!(
            categories(CategoryFacet::QuickDelivery),
            "/categories?quickDelivery=true"
        );
    }

    #[test]
    fn test_restaurant_paths() {
        let center = GeoPoint::new(12.9, 77.6);
        assert_eq!(restaurants(None), "/restaurants");
        assert_eq!(
            restaurants(Some((center, 5.0))),
            "/restaurants?lat=12.9&lng=77.6&radius=5"
        );
        assert_eq!(
            restaurants_nearby(center),
            "/restaurants/nearby?lat=12.9&lng=77.6"
        );
    }
}
