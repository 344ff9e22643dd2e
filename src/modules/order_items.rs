use std::sync::Arc;

use shopkeep_kernel::{IndexSpec, Module};

/// Order lines, joined to both their order and the product sold.
pub struct OrderItemsModule;

impl OrderItemsModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for OrderItemsModule {
    fn name(&self) -> &'static str {
        "order_items"
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![
            IndexSpec::unique("order_item_id"),
            IndexSpec::ascending("order_id"),
            IndexSpec::ascending("product_id"),
        ]
    }
}

/// Create a new instance of the order_items module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(OrderItemsModule::new())
}
