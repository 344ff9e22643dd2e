use std::sync::Arc;

use shopkeep_kernel::{IndexSpec, Module};

/// Orders, looked up by the customer who placed them.
pub struct OrdersModule;

impl OrdersModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for OrdersModule {
    fn name(&self) -> &'static str {
        "orders"
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![IndexSpec::unique("order_id"), IndexSpec::ascending("customer_id")]
    }
}

/// Create a new instance of the orders module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(OrdersModule::new())
}
