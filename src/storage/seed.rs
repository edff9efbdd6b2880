//! Deterministic seed data.
//!
//! Installed when no usable snapshot exists: one admin account with its
//! profile, a small category and product catalog, and a welcome
//! notification. The content never varies between runs.

use super::TableRegistry;
use crate::models::{Record, TableId, Value};

/// Key of the seeded admin account.
pub const ADMIN_USER_ID: &str = "u-admin";

/// Builds the seed registry.
#[must_use]
pub fn seed_registry() -> TableRegistry {
    let mut registry = TableRegistry::new();

    registry.table_mut(TableId::Users).push(record([
        ("id", Value::from(ADMIN_USER_ID)),
        ("email", Value::from("admin@storefront.local")),
        ("name", Value::from("Administrator")),
        ("role", Value::from("admin")),
        ("is_active", Value::from(true)),
    ]));

    registry.table_mut(TableId::UserProfiles).push(record([
        ("user_id", Value::from(ADMIN_USER_ID)),
        ("display_name", Value::from("Admin")),
        ("phone", Value::from("")),
        ("avatar_url", Value::Null),
    ]));

    let categories = [
        ("c-electronics", "Electronics", 1_i64),
        ("c-home", "Home & Kitchen", 2),
        ("c-books", "Books", 3),
    ];
    for (id, name, sort_order) in categories {
        registry.table_mut(TableId::Categories).push(record([
            ("id", Value::from(id)),
            ("name", Value::from(name)),
            ("sort_order", Value::from(sort_order)),
        ]));
    }

    let products = [
        ("p-headphones", "Wireless Headphones", "c-electronics", 59.9, 25_i64),
        ("p-charger", "USB-C Charger", "c-electronics", 19.5, 120),
        ("p-kettle", "Electric Kettle", "c-home", 34.0, 40),
        ("p-mug", "Ceramic Mug", "c-home", 8.75, 300),
        ("p-novel", "Paperback Novel", "c-books", 12.99, 75),
    ];
    for (id, name, category_id, price, stock) in products {
        registry.table_mut(TableId::Products).push(record([
            ("id", Value::from(id)),
            ("name", Value::from(name)),
            ("category_id", Value::from(category_id)),
            ("price", Value::from(price)),
            ("stock", Value::from(stock)),
            ("is_active", Value::from(true)),
        ]));
    }

    registry.table_mut(TableId::Notifications).push(record([
        ("id", Value::from("n-welcome")),
        ("user_id", Value::from(ADMIN_USER_ID)),
        ("title", Value::from("Welcome to the storefront")),
        ("status", Value::from("unread")),
    ]));

    registry
}

fn record<const N: usize>(fields: [(&str, Value); N]) -> Record {
    fields.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_deterministic() {
        assert_eq!(seed_registry(), seed_registry());
    }

    #[test]
    fn test_seed_contents() {
        let registry = seed_registry();
        assert_eq!(registry.table(TableId::Users).len(), 1);
        assert_eq!(registry.table(TableId::UserProfiles).len(), 1);
        assert_eq!(registry.table(TableId::Categories).len(), 3);
        assert_eq!(registry.table(TableId::Products).len(), 5);
        assert!(registry.table(TableId::Orders).is_empty());

        let admin = &registry.table(TableId::Users).records()[0];
        assert_eq!(admin.get("role"), Some(&Value::from("admin")));
    }

    #[test]
    fn test_every_product_references_a_seeded_category() {
        let registry = seed_registry();
        let categories = registry.table(TableId::Categories).records();
        for product in registry.table(TableId::Products).records() {
            let category = product.get("category_id").unwrap();
            assert!(
                categories
                    .iter()
                    .any(|c| c.get("id").is_some_and(|id| id.loose_eq(category))),
                "dangling category {category}"
            );
        }
    }
}
