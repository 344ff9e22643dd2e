use crate::schema::{CollectionSpec, IndexSpec};

/// A domain module owning one collection of the schema.
pub trait Module: Sync + Send {
    /// Collection name; unique across the registry
    fn name(&self) -> &'static str;

    /// Indexes the collection must carry, excluding `_id`
    fn indexes(&self) -> Vec<IndexSpec>;

    /// Collection definition handed to the initializer
    fn collection(&self) -> CollectionSpec {
        CollectionSpec::new(self.name(), self.indexes())
    }
}
