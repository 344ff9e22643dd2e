//! Declarative schema objects: collections, indexes and the application user.

use std::fmt;

use serde::Serialize;

/// Sort direction of an index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Numeric value used in MongoDB key documents.
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Direction::Ascending),
            -1 => Some(Direction::Descending),
            _ => None,
        }
    }
}

/// A single field of an index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexKey {
    pub field: String,
    pub direction: Direction,
}

/// Index definition on one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexSpec {
    pub keys: Vec<IndexKey>,
    pub unique: bool,
}

impl IndexSpec {
    /// Unique ascending index on `field`.
    pub fn unique(field: &str) -> Self {
        Self {
            keys: vec![IndexKey {
                field: field.to_string(),
                direction: Direction::Ascending,
            }],
            unique: true,
        }
    }

    /// Non-unique ascending index on `field`.
    pub fn ascending(field: &str) -> Self {
        Self {
            keys: vec![IndexKey {
                field: field.to_string(),
                direction: Direction::Ascending,
            }],
            unique: false,
        }
    }

    /// Server-style default name, e.g. `customer_id_1`.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|key| format!("{}_{}", key.field, key.direction.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// True when both specs index the same keys in the same order.
    pub fn same_keys(&self, other: &IndexSpec) -> bool {
        self.keys == other.keys
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        if self.unique {
            write!(f, " (unique)")?;
        }
        Ok(())
    }
}

/// Indexes found on a collection, excluding `_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexListing {
    /// Indexes whose keys all carry a sort direction.
    pub indexes: Vec<IndexSpec>,
    /// Names of text, hashed, geo and other non-directional indexes.
    pub other: Vec<String>,
}

/// A collection and the indexes it must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSpec {
    pub name: String,
    indexes: Vec<IndexSpec>,
}

impl CollectionSpec {
    /// Unique indexes are ordered ahead of secondary ones; relative order within
    /// each group is preserved.
    pub fn new(name: impl Into<String>, indexes: Vec<IndexSpec>) -> Self {
        let mut indexes = indexes;
        indexes.sort_by_key(|index| !index.unique);
        Self {
            name: name.into(),
            indexes,
        }
    }

    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    pub fn unique_indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.indexes.iter().filter(|index| index.unique)
    }

    pub fn secondary_indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.indexes.iter().filter(|index| !index.unique)
    }
}

/// Role granted to a user on one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleBinding {
    pub role: String,
    #[serde(rename = "db")]
    pub database: String,
}

impl RoleBinding {
    pub fn read_write(database: &str) -> Self {
        Self {
            role: "readWrite".to_string(),
            database: database.to_string(),
        }
    }
}

/// Secret string whose `Debug`/`Display`/`Serialize` never reveal the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl Serialize for Password {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("<redacted>")
    }
}

/// Application principal created by the initializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppUser {
    pub username: String,
    pub password: Password,
    pub roles: Vec<RoleBinding>,
}

impl AppUser {
    /// User with a single `readWrite` role on `database`.
    pub fn read_write(username: impl Into<String>, password: Password, database: &str) -> Self {
        Self {
            username: username.into(),
            password,
            roles: vec![RoleBinding::read_write(database)],
        }
    }
}
