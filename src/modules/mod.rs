pub mod customers;
pub mod order_items;
pub mod orders;
pub mod product_reviews;
pub mod products;

use shopkeep_kernel::ModuleRegistry;

/// Register the e-commerce collections. Provisioning follows this order.
pub fn register_all(registry: &mut ModuleRegistry) -> anyhow::Result<()> {
    registry.register(customers::create_module())?;
    registry.register(products::create_module())?;
    registry.register(orders::create_module())?;
    registry.register(order_items::create_module())?;
    registry.register(product_reviews::create_module())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        register_all(&mut registry).unwrap();
        registry
    }

    fn index_names(registry: &ModuleRegistry, collection: &str, unique: bool) -> Vec<String> {
        registry
            .get_module(collection)
            .unwrap()
            .collection()
            .indexes()
            .iter()
            .filter(|index| index.unique == unique)
            .map(|index| index.name())
            .collect()
    }

    #[test]
    fn collections_are_registered_in_provisioning_order() {
        let names: Vec<_> = registry()
            .collect_collections()
            .into_iter()
            .map(|collection| collection.name)
            .collect();
        assert_eq!(
            names,
            ["customers", "products", "orders", "order_items", "product_reviews"]
        );
    }

    #[test]
    fn unique_constraints_match_business_keys() {
        let registry = registry();
        assert_eq!(
            index_names(&registry, "customers", true),
            ["customer_id_1", "email_1"]
        );
        assert_eq!(index_names(&registry, "products", true), ["product_id_1"]);
        assert_eq!(index_names(&registry, "orders", true), ["order_id_1"]);
        assert_eq!(
            index_names(&registry, "order_items", true),
            ["order_item_id_1"]
        );
        assert_eq!(
            index_names(&registry, "product_reviews", true),
            ["review_id_1"]
        );
    }

    #[test]
    fn lookup_indexes_are_not_unique() {
        let registry = registry();
        assert!(index_names(&registry, "customers", false).is_empty());
        assert_eq!(index_names(&registry, "products", false), ["category_1"]);
        assert_eq!(index_names(&registry, "orders", false), ["customer_id_1"]);
        assert_eq!(
            index_names(&registry, "order_items", false),
            ["order_id_1", "product_id_1"]
        );
        assert_eq!(
            index_names(&registry, "product_reviews", false),
            ["product_id_1", "customer_id_1"]
        );
    }

    #[test]
    fn catalog_declares_twelve_indexes() {
        let total: usize = registry()
            .collect_collections()
            .iter()
            .map(|collection| collection.indexes().len())
            .sum();
        assert_eq!(total, 12);
    }
}
