//! In-memory [`SchemaAdmin`] with MongoDB's create semantics.
//!
//! Used to preview the call sequence without a server and to exercise the
//! initializer in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::admin::SchemaAdmin;
use crate::error::AdminError;
use crate::schema::{AppUser, IndexListing, IndexSpec, RoleBinding};

/// One call received by [`MemoryAdmin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum AdminCall {
    SelectDatabase {
        database: String,
    },
    CreateUser {
        database: String,
        username: String,
        roles: Vec<RoleBinding>,
    },
    CreateCollection {
        database: String,
        collection: String,
    },
    CreateIndex {
        database: String,
        collection: String,
        index: String,
        unique: bool,
    },
    UserExists {
        database: String,
        username: String,
    },
    ListCollections {
        database: String,
    },
    ListIndexes {
        database: String,
        collection: String,
    },
}

impl AdminCall {
    /// True for calls that change server state (including the database switch).
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            AdminCall::SelectDatabase { .. }
                | AdminCall::CreateUser { .. }
                | AdminCall::CreateCollection { .. }
                | AdminCall::CreateIndex { .. }
        )
    }
}

impl fmt::Display for AdminCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminCall::SelectDatabase { database } => write!(f, "use {}", database),
            AdminCall::CreateUser {
                database,
                username,
                roles,
            } => {
                let roles = roles
                    .iter()
                    .map(|binding| format!("{}@{}", binding.role, binding.database))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}.createUser {} [{}]", database, username, roles)
            }
            AdminCall::CreateCollection {
                database,
                collection,
            } => write!(f, "{}.createCollection {}", database, collection),
            AdminCall::CreateIndex {
                database,
                collection,
                index,
                unique,
            } => {
                write!(f, "{}.{}.createIndex {}", database, collection, index)?;
                if *unique {
                    write!(f, " unique")?;
                }
                Ok(())
            }
            AdminCall::UserExists { database, username } => {
                write!(f, "{}.usersInfo {}", database, username)
            }
            AdminCall::ListCollections { database } => {
                write!(f, "{}.listCollections", database)
            }
            AdminCall::ListIndexes {
                database,
                collection,
            } => write!(f, "{}.{}.listIndexes", database, collection),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct DatabaseState {
    users: BTreeSet<String>,
    collections: BTreeMap<String, Vec<IndexSpec>>,
    other_indexes: BTreeMap<String, Vec<String>>,
}

/// Server double that records every call in order.
#[derive(Debug, Default)]
pub struct MemoryAdmin {
    databases: BTreeMap<String, DatabaseState>,
    selected: Option<String>,
    calls: Vec<AdminCall>,
    failures: Vec<(AdminCall, AdminError)>,
}

impl MemoryAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the first call equal to `call` fail with `error`.
    pub fn fail_on(mut self, call: AdminCall, error: AdminError) -> Self {
        self.failures.push((call, error));
        self
    }

    /// Every call received so far.
    pub fn calls(&self) -> &[AdminCall] {
        &self.calls
    }

    /// State-changing calls only, without introspection.
    pub fn mutations(&self) -> Vec<&AdminCall> {
        self.calls.iter().filter(|call| call.is_mutation()).collect()
    }

    /// Forget recorded calls but keep server state.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn collection_names(&self, database: &str) -> Vec<String> {
        self.databases
            .get(database)
            .map(|state| state.collections.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn indexes(&self, database: &str, collection: &str) -> Vec<IndexSpec> {
        self.databases
            .get(database)
            .and_then(|state| state.collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Seed a non-directional index (text, hashed, geo) by name. Such indexes
    /// are invisible to the catalog and only surface through listings.
    pub fn add_other_index(&mut self, database: &str, collection: &str, name: &str) {
        let state = self.state(database);
        state.collections.entry(collection.to_string()).or_default();
        state
            .other_indexes
            .entry(collection.to_string())
            .or_default()
            .push(name.to_string());
    }

    pub fn has_user(&self, database: &str, username: &str) -> bool {
        self.databases
            .get(database)
            .is_some_and(|state| state.users.contains(username))
    }

    fn record(&mut self, call: AdminCall) -> Result<(), AdminError> {
        let failure = self
            .failures
            .iter()
            .position(|(expected, _)| *expected == call);
        self.calls.push(call);
        match failure {
            Some(position) => Err(self.failures.remove(position).1),
            None => Ok(()),
        }
    }

    fn selected(&self) -> Result<String, AdminError> {
        self.selected.clone().ok_or(AdminError::NoDatabaseSelected)
    }

    fn state(&mut self, database: &str) -> &mut DatabaseState {
        self.databases.entry(database.to_string()).or_default()
    }
}

#[async_trait]
impl SchemaAdmin for MemoryAdmin {
    async fn select_database(&mut self, name: &str) -> Result<(), AdminError> {
        self.record(AdminCall::SelectDatabase {
            database: name.to_string(),
        })?;
        self.selected = Some(name.to_string());
        Ok(())
    }

    async fn create_user(&mut self, user: &AppUser) -> Result<(), AdminError> {
        let database = self.selected()?;
        self.record(AdminCall::CreateUser {
            database: database.clone(),
            username: user.username.clone(),
            roles: user.roles.clone(),
        })?;

        if !self.state(&database).users.insert(user.username.clone()) {
            return Err(AdminError::AlreadyExists(format!(
                "user \"{}@{}\"",
                user.username, database
            )));
        }
        Ok(())
    }

    async fn create_collection(&mut self, name: &str) -> Result<(), AdminError> {
        let database = self.selected()?;
        self.record(AdminCall::CreateCollection {
            database: database.clone(),
            collection: name.to_string(),
        })?;

        let state = self.state(&database);
        if state.collections.contains_key(name) {
            return Err(AdminError::AlreadyExists(format!(
                "collection {}.{}",
                database, name
            )));
        }
        state.collections.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn create_index(
        &mut self,
        collection: &str,
        index: &IndexSpec,
    ) -> Result<(), AdminError> {
        let database = self.selected()?;
        self.record(AdminCall::CreateIndex {
            database: database.clone(),
            collection: collection.to_string(),
            index: index.name(),
            unique: index.unique,
        })?;

        // Index creation implicitly creates the collection.
        let indexes = self
            .state(&database)
            .collections
            .entry(collection.to_string())
            .or_default();

        match indexes.iter().find(|existing| existing.same_keys(index)) {
            Some(existing) if existing == index => Ok(()),
            Some(_) => Err(AdminError::AlreadyExists(format!(
                "index {} on {} with different options",
                index.name(),
                collection
            ))),
            None => {
                indexes.push(index.clone());
                Ok(())
            }
        }
    }

    async fn user_exists(&mut self, username: &str) -> Result<bool, AdminError> {
        let database = self.selected()?;
        self.record(AdminCall::UserExists {
            database: database.clone(),
            username: username.to_string(),
        })?;
        Ok(self.has_user(&database, username))
    }

    async fn list_collections(&mut self) -> Result<Vec<String>, AdminError> {
        let database = self.selected()?;
        self.record(AdminCall::ListCollections {
            database: database.clone(),
        })?;
        Ok(self.collection_names(&database))
    }

    async fn list_indexes(&mut self, collection: &str) -> Result<IndexListing, AdminError> {
        let database = self.selected()?;
        self.record(AdminCall::ListIndexes {
            database: database.clone(),
            collection: collection.to_string(),
        })?;
        let other = self
            .databases
            .get(&database)
            .and_then(|state| state.other_indexes.get(collection))
            .cloned()
            .unwrap_or_default();
        Ok(IndexListing {
            indexes: self.indexes(&database, collection),
            other,
        })
    }
}
