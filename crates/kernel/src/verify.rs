//! Drift detection between the declared schema and what the server holds.

use serde::Serialize;

use crate::admin::SchemaAdmin;
use crate::error::{InitError, Step};
use crate::initializer::SchemaInitializer;

/// An index whose keys match the declaration but whose uniqueness does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniquenessMismatch {
    pub collection: String,
    pub index: String,
    pub expected_unique: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub database: String,
    pub missing_user: Option<String>,
    pub missing_collections: Vec<String>,
    /// `(collection, index name)`
    pub missing_indexes: Vec<(String, String)>,
    /// `(collection, index name)`
    pub unexpected_indexes: Vec<(String, String)>,
    pub uniqueness_mismatches: Vec<UniquenessMismatch>,
}

impl Verification {
    pub fn is_clean(&self) -> bool {
        self.missing_user.is_none()
            && self.missing_collections.is_empty()
            && self.missing_indexes.is_empty()
            && self.unexpected_indexes.is_empty()
            && self.uniqueness_mismatches.is_empty()
    }

    /// Human-readable findings, one per line.
    pub fn findings(&self) -> Vec<String> {
        let mut findings = Vec::new();
        if let Some(username) = &self.missing_user {
            findings.push(format!("missing user {}", username));
        }
        for collection in &self.missing_collections {
            findings.push(format!("missing collection {}", collection));
        }
        for (collection, index) in &self.missing_indexes {
            findings.push(format!("missing index {} on {}", index, collection));
        }
        for (collection, index) in &self.unexpected_indexes {
            findings.push(format!("unexpected index {} on {}", index, collection));
        }
        for mismatch in &self.uniqueness_mismatches {
            findings.push(format!(
                "index {} on {} should {}be unique",
                mismatch.index,
                mismatch.collection,
                if mismatch.expected_unique { "" } else { "not " }
            ));
        }
        findings
    }
}

/// Compare the server with what `initializer` would provision. Read-only apart
/// from the database switch.
pub async fn verify(
    initializer: &SchemaInitializer,
    admin: &mut dyn SchemaAdmin,
) -> Result<Verification, InitError> {
    let database = initializer.database().to_string();
    admin.select_database(&database).await.map_err(|source| {
        InitError::new(
            Step::SelectDatabase {
                database: database.clone(),
            },
            source,
        )
    })?;

    let mut verification = Verification {
        database,
        ..Verification::default()
    };

    let username = &initializer.user().username;
    let user_exists = admin.user_exists(username).await.map_err(|source| {
        InitError::new(
            Step::Inspect {
                what: format!("user '{}'", username),
            },
            source,
        )
    })?;
    if !user_exists {
        verification.missing_user = Some(username.clone());
    }

    let collections = admin.list_collections().await.map_err(|source| {
        InitError::new(
            Step::Inspect {
                what: "collections".to_string(),
            },
            source,
        )
    })?;

    for collection in initializer.collections() {
        if !collections.contains(&collection.name) {
            verification.missing_collections.push(collection.name.clone());
            continue;
        }

        let listing = admin
            .list_indexes(&collection.name)
            .await
            .map_err(|source| {
                InitError::new(
                    Step::Inspect {
                        what: format!("indexes of '{}'", collection.name),
                    },
                    source,
                )
            })?;

        for expected in collection.indexes() {
            match listing.indexes.iter().find(|index| index.same_keys(expected)) {
                Some(actual) if actual.unique != expected.unique => {
                    verification.uniqueness_mismatches.push(UniquenessMismatch {
                        collection: collection.name.clone(),
                        index: expected.name(),
                        expected_unique: expected.unique,
                    });
                }
                Some(_) => {}
                None => verification
                    .missing_indexes
                    .push((collection.name.clone(), expected.name())),
            }
        }

        let unexpected = listing.indexes.iter().filter(|index| {
            !collection
                .indexes()
                .iter()
                .any(|expected| expected.same_keys(index))
        });
        for index in unexpected {
            verification
                .unexpected_indexes
                .push((collection.name.clone(), index.name()));
        }
        // Text, hashed and geo indexes are never declared.
        for name in &listing.other {
            verification
                .unexpected_indexes
                .push((collection.name.clone(), name.clone()));
        }
    }

    Ok(verification)
}
