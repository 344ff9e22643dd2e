//! The provisioning sequence: select database, create the application user,
//! then each collection followed by its indexes.

use std::fmt;

use serde::Serialize;

use crate::admin::SchemaAdmin;
use crate::error::{AdminError, InitError, Step};
use crate::schema::{AppUser, CollectionSpec, IndexSpec};
use crate::settings::ExistingPolicy;

/// Whether a resource was created by this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    User { username: String },
    Collection { name: String },
    Index { collection: String, index: String },
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::User { username } => write!(f, "user {}", username),
            Resource::Collection { name } => write!(f, "collection {}", name),
            Resource::Index { collection, index } => {
                write!(f, "index {} on {}", index, collection)
            }
        }
    }
}

/// What a run did, resource by resource, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub database: String,
    pub entries: Vec<(Resource, Outcome)>,
}

impl InitReport {
    pub fn created(&self) -> usize {
        self.count(Outcome::Created)
    }

    pub fn already_present(&self) -> usize {
        self.count(Outcome::AlreadyPresent)
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.entries
            .iter()
            .filter(|(_, entry)| *entry == outcome)
            .count()
    }

    fn push(&mut self, resource: Resource, outcome: Outcome) {
        match outcome {
            Outcome::Created => tracing::info!(%resource, "created"),
            Outcome::AlreadyPresent => tracing::info!(%resource, "already present"),
        }
        self.entries.push((resource, outcome));
    }
}

/// Provisions one database with an application user and a fixed set of
/// collections.
#[derive(Debug, Clone)]
pub struct SchemaInitializer {
    database: String,
    user: AppUser,
    collections: Vec<CollectionSpec>,
    policy: ExistingPolicy,
}

impl SchemaInitializer {
    pub fn new(database: impl Into<String>, user: AppUser, collections: Vec<CollectionSpec>) -> Self {
        Self {
            database: database.into(),
            user,
            collections,
            policy: ExistingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExistingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> &AppUser {
        &self.user
    }

    pub fn collections(&self) -> &[CollectionSpec] {
        &self.collections
    }

    pub fn policy(&self) -> ExistingPolicy {
        self.policy
    }

    /// Run the sequence once. Steps execute strictly in order and the first
    /// fatal failure aborts the run.
    pub async fn run(&self, admin: &mut dyn SchemaAdmin) -> Result<InitReport, InitError> {
        tracing::info!(
            database = %self.database,
            policy = %self.policy,
            collections = self.collections.len(),
            "provisioning schema"
        );

        admin
            .select_database(&self.database)
            .await
            .map_err(|source| {
                InitError::new(
                    Step::SelectDatabase {
                        database: self.database.clone(),
                    },
                    source,
                )
            })?;

        let mut report = InitReport {
            database: self.database.clone(),
            entries: Vec::new(),
        };

        self.ensure_user(admin, &mut report).await?;

        let existing_collections = match self.policy {
            ExistingPolicy::Check => admin.list_collections().await.map_err(|source| {
                InitError::new(
                    Step::Inspect {
                        what: "collections".to_string(),
                    },
                    source,
                )
            })?,
            ExistingPolicy::Ignore | ExistingPolicy::Fail => Vec::new(),
        };

        for collection in &self.collections {
            let exists = existing_collections.contains(&collection.name);
            self.ensure_collection(admin, collection, exists, &mut report)
                .await?;
        }

        tracing::info!(
            database = %self.database,
            created = report.created(),
            already_present = report.already_present(),
            "schema provisioned"
        );
        Ok(report)
    }

    async fn ensure_user(
        &self,
        admin: &mut dyn SchemaAdmin,
        report: &mut InitReport,
    ) -> Result<(), InitError> {
        let step = Step::CreateUser {
            username: self.user.username.clone(),
        };
        let resource = Resource::User {
            username: self.user.username.clone(),
        };

        if self.policy == ExistingPolicy::Check {
            let exists = admin
                .user_exists(&self.user.username)
                .await
                .map_err(|source| {
                    InitError::new(
                        Step::Inspect {
                            what: format!("user '{}'", self.user.username),
                        },
                        source,
                    )
                })?;
            if exists {
                report.push(resource, Outcome::AlreadyPresent);
                return Ok(());
            }
        }

        let outcome = self.settle(admin.create_user(&self.user).await, step)?;
        report.push(resource, outcome);
        Ok(())
    }

    async fn ensure_collection(
        &self,
        admin: &mut dyn SchemaAdmin,
        collection: &CollectionSpec,
        exists: bool,
        report: &mut InitReport,
    ) -> Result<(), InitError> {
        let resource = Resource::Collection {
            name: collection.name.clone(),
        };

        let present_indexes: Vec<IndexSpec> = if exists {
            report.push(resource, Outcome::AlreadyPresent);
            admin
                .list_indexes(&collection.name)
                .await
                .map_err(|source| inspect_indexes_error(&collection.name, source))?
                .indexes
        } else {
            let step = Step::CreateCollection {
                collection: collection.name.clone(),
            };
            let outcome = self.settle(admin.create_collection(&collection.name).await, step)?;
            report.push(resource, outcome);
            Vec::new()
        };

        for index in collection.indexes() {
            let resource = Resource::Index {
                collection: collection.name.clone(),
                index: index.name(),
            };

            if present_indexes.contains(index) {
                report.push(resource, Outcome::AlreadyPresent);
                continue;
            }

            tracing::debug!(
                collection = %collection.name,
                index = %index.name(),
                unique = index.unique,
                "creating index"
            );
            let step = Step::CreateIndex {
                collection: collection.name.clone(),
                index: index.name(),
            };
            let result = admin.create_index(&collection.name, index).await;
            let outcome = self
                .settle_index(admin, &collection.name, index, result, step)
                .await?;
            report.push(resource, outcome);
        }

        Ok(())
    }

    /// Apply the existing-resource policy to the result of a create call.
    fn settle(&self, result: Result<(), AdminError>, step: Step) -> Result<Outcome, InitError> {
        match result {
            Ok(()) => Ok(Outcome::Created),
            Err(source) if source.is_already_exists() && self.policy == ExistingPolicy::Ignore => {
                tracing::warn!(%step, error = %source, "ignoring existing resource");
                Ok(Outcome::AlreadyPresent)
            }
            Err(source) => Err(InitError::new(step, source)),
        }
    }

    /// Like [`Self::settle`], but an "already exists" on an index only counts as
    /// satisfied when the server holds an index with the same keys and the same
    /// uniqueness. Conflicting options stay fatal under every policy.
    async fn settle_index(
        &self,
        admin: &mut dyn SchemaAdmin,
        collection: &str,
        index: &IndexSpec,
        result: Result<(), AdminError>,
        step: Step,
    ) -> Result<Outcome, InitError> {
        match result {
            Ok(()) => Ok(Outcome::Created),
            Err(source) if source.is_already_exists() && self.policy == ExistingPolicy::Ignore => {
                let listing = admin
                    .list_indexes(collection)
                    .await
                    .map_err(|err| inspect_indexes_error(collection, err))?;
                if listing.indexes.contains(index) {
                    tracing::warn!(%step, error = %source, "ignoring existing index");
                    Ok(Outcome::AlreadyPresent)
                } else {
                    Err(InitError::new(step, source))
                }
            }
            Err(source) => Err(InitError::new(step, source)),
        }
    }
}

fn inspect_indexes_error(collection: &str, source: AdminError) -> InitError {
    InitError::new(
        Step::Inspect {
            what: format!("indexes of '{}'", collection),
        },
        source,
    )
}
