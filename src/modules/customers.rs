use std::sync::Arc;

use shopkeep_kernel::{IndexSpec, Module};

/// Customer accounts. Both the business id and the login email are unique.
pub struct CustomersModule;

impl CustomersModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for CustomersModule {
    fn name(&self) -> &'static str {
        "customers"
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![IndexSpec::unique("customer_id"), IndexSpec::unique("email")]
    }
}

/// Create a new instance of the customers module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(CustomersModule::new())
}
