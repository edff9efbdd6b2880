//! Registered table identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered table.
///
/// The set is fixed at compile time. Callers address tables by the wire
/// identifier returned from [`TableId::as_str`]; anything outside this set
/// resolves to [`crate::Error::TableNotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableId {
    /// User accounts.
    Users,
    /// User profiles, keyed by `user_id`.
    UserProfiles,
    /// Shipping addresses.
    Addresses,
    /// Product catalog.
    Products,
    /// Product categories.
    Categories,
    /// Cart line items.
    Carts,
    /// Orders.
    Orders,
    /// Order line items.
    OrderItems,
    /// User notifications.
    Notifications,
    /// Marketing campaigns.
    Campaigns,
    /// Product reviews.
    Reviews,
}

impl TableId {
    /// Returns all registered tables in registration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Users,
            Self::UserProfiles,
            Self::Addresses,
            Self::Products,
            Self::Categories,
            Self::Carts,
            Self::Orders,
            Self::OrderItems,
            Self::Notifications,
            Self::Campaigns,
            Self::Reviews,
        ]
    }

    /// Returns the wire identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::UserProfiles => "user_profiles",
            Self::Addresses => "addresses",
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Carts => "carts",
            Self::Orders => "orders",
            Self::OrderItems => "order_items",
            Self::Notifications => "notifications",
            Self::Campaigns => "campaigns",
            Self::Reviews => "reviews",
        }
    }

    /// Parses a wire identifier. Matching is exact.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
