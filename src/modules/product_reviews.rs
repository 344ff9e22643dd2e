use std::sync::Arc;

use shopkeep_kernel::{IndexSpec, Module};

/// Reviews, listed per product and per author.
pub struct ProductReviewsModule;

impl ProductReviewsModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for ProductReviewsModule {
    fn name(&self) -> &'static str {
        "product_reviews"
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![
            IndexSpec::unique("review_id"),
            IndexSpec::ascending("product_id"),
            IndexSpec::ascending("customer_id"),
        ]
    }
}

/// Create a new instance of the product_reviews module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(ProductReviewsModule::new())
}
