//! Core types for shopkeep: settings, schema definitions, the module registry,
//! the administrative boundary and the provisioning procedure.

pub mod admin;
pub mod error;
pub mod initializer;
pub mod memory;
pub mod module;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod verify;

pub use admin::SchemaAdmin;
pub use error::{AdminError, InitError, Step};
pub use initializer::{InitReport, Outcome, Resource, SchemaInitializer};
pub use memory::{AdminCall, MemoryAdmin};
pub use module::Module;
pub use registry::ModuleRegistry;
pub use schema::{
    AppUser, CollectionSpec, Direction, IndexKey, IndexListing, IndexSpec, Password, RoleBinding,
};
pub use settings::{ExistingPolicy, Settings};
pub use verify::{verify, Verification};
