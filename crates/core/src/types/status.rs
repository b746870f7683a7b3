//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Order fulfilment status.
///
/// Maps to the backend's order status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the order is still in flight (not delivered or cancelled).
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Preparing => write!(f, "preparing"),
            Self::OutForDelivery => write!(f, "out_for_delivery"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Dietary type of a product, also sent as the `type` request header when a
/// diet filter is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietType {
    Veg,
    NonVeg,
}

impl DietType {
    /// Wire value used both in payloads and in the `type` header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Veg => "veg",
            Self::NonVeg => "non-veg",
        }
    }
}

impl std::fmt::Display for DietType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent query dimension for category lists.
///
/// A category fetched under one facet never populates another facet's slot;
/// each facet is cached independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFacet {
    #[default]
    Plain,
    HighProtein,
    QuickDelivery,
}

impl CategoryFacet {
    /// All facets, in slot order.
    pub const ALL: [Self; 3] = [Self::Plain, Self::HighProtein, Self::QuickDelivery];

    /// Query flag appended to the category list endpoint, if any.
    #[must_use]
    pub const fn query_flag(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::HighProtein => Some("highProtein=true"),
            Self::QuickDelivery => Some("quickDelivery=true"),
        }
    }
}
