use std::sync::Arc;

use shopkeep_kernel::{IndexSpec, Module};

/// Product catalog, browsed by category.
pub struct ProductsModule;

impl ProductsModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for ProductsModule {
    fn name(&self) -> &'static str {
        "products"
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![IndexSpec::unique("product_id"), IndexSpec::ascending("category")]
    }
}

/// Create a new instance of the products module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(ProductsModule::new())
}
