//! MongoDB client factory and schema administration.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    error::{Error, ErrorKind},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Database, IndexModel,
};

use shopkeep_kernel::settings::DatabaseSettings;
use shopkeep_kernel::{
    AdminError, AppUser, Direction, IndexKey, IndexListing, IndexSpec, SchemaAdmin,
};

const UNAUTHORIZED: i32 = 13;
const AUTHENTICATION_FAILED: i32 = 18;
const NAMESPACE_NOT_FOUND: i32 = 26;
const NAMESPACE_EXISTS: i32 = 48;
const INDEX_ALREADY_EXISTS: i32 = 68;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
const DUPLICATE_KEY: i32 = 11000;
const USER_ALREADY_EXISTS: i32 = 51003;

/// [`SchemaAdmin`] backed by a live MongoDB deployment.
pub struct MongoAdmin {
    client: Client,
    database: Option<Database>,
}

impl MongoAdmin {
    /// Build a client from `settings` and confirm the server answers `ping`.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, AdminError> {
        let mut options = ClientOptions::parse(&settings.uri)
            .await
            .map_err(classify)?;
        options.app_name = Some(settings.app_name.clone());
        options.server_selection_timeout =
            Some(Duration::from_millis(settings.server_selection_timeout_ms));
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

        let client = Client::with_options(options).map_err(classify)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(classify)?;

        tracing::info!(target: "shopkeep-db", app_name = %settings.app_name, "connected to MongoDB");
        Ok(Self::from_client(client))
    }

    /// Wrap an existing client; no database is selected yet.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            database: None,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn db(&self) -> Result<&Database, AdminError> {
        self.database.as_ref().ok_or(AdminError::NoDatabaseSelected)
    }
}

#[async_trait]
impl SchemaAdmin for MongoAdmin {
    async fn select_database(&mut self, name: &str) -> Result<(), AdminError> {
        tracing::debug!(target: "shopkeep-db", database = name, "selecting database");
        self.database = Some(self.client.database(name));
        Ok(())
    }

    async fn create_user(&mut self, user: &AppUser) -> Result<(), AdminError> {
        let roles: Vec<Document> = user
            .roles
            .iter()
            .map(|binding| doc! { "role": binding.role.as_str(), "db": binding.database.as_str() })
            .collect();

        self.db()?
            .run_command(doc! {
                "createUser": user.username.as_str(),
                "pwd": user.password.expose(),
                "roles": roles,
            })
            .await
            .map_err(classify_user)?;
        Ok(())
    }

    async fn create_collection(&mut self, name: &str) -> Result<(), AdminError> {
        self.db()?.create_collection(name).await.map_err(classify)
    }

    async fn create_index(
        &mut self,
        collection: &str,
        index: &IndexSpec,
    ) -> Result<(), AdminError> {
        self.db()?
            .collection::<Document>(collection)
            .create_index(index_model(index))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn user_exists(&mut self, username: &str) -> Result<bool, AdminError> {
        let reply = self
            .db()?
            .run_command(doc! { "usersInfo": username })
            .await
            .map_err(classify)?;
        Ok(reply
            .get_array("users")
            .map(|users| !users.is_empty())
            .unwrap_or(false))
    }

    async fn list_collections(&mut self) -> Result<Vec<String>, AdminError> {
        self.db()?.list_collection_names().await.map_err(classify)
    }

    async fn list_indexes(&mut self, collection: &str) -> Result<IndexListing, AdminError> {
        let cursor = match self
            .db()?
            .collection::<Document>(collection)
            .list_indexes()
            .await
        {
            Ok(cursor) => cursor,
            Err(err) if command_code(&err) == Some(NAMESPACE_NOT_FOUND) => {
                return Ok(IndexListing::default())
            }
            Err(err) => return Err(classify(err)),
        };
        let models: Vec<IndexModel> = cursor.try_collect().await.map_err(classify)?;
        Ok(index_listing(collection, &models))
    }
}

/// Split server indexes into directional specs and the names of everything
/// else. `_id` is dropped.
fn index_listing(collection: &str, models: &[IndexModel]) -> IndexListing {
    let mut listing = IndexListing::default();
    for model in models.iter().filter(|model| !is_id_index(model)) {
        match index_spec(model) {
            Some(spec) => listing.indexes.push(spec),
            None => {
                let name = model
                    .options
                    .as_ref()
                    .and_then(|options| options.name.clone())
                    .unwrap_or_else(|| model.keys.to_string());
                tracing::debug!(
                    target: "shopkeep-db",
                    collection,
                    index = %name,
                    keys = %model.keys,
                    "index with non-directional keys"
                );
                listing.other.push(name);
            }
        }
    }
    listing
}

fn index_model(index: &IndexSpec) -> IndexModel {
    let mut keys = Document::new();
    for key in &index.keys {
        keys.insert(key.field.clone(), key.direction.as_i32());
    }

    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(index.unique)
                .name(index.name())
                .build(),
        )
        .build()
}

fn is_id_index(model: &IndexModel) -> bool {
    model.keys.len() == 1 && model.keys.contains_key("_id")
}

/// Convert a server index back into an [`IndexSpec`]. Returns `None` for text,
/// hashed or geo keys, which have no direction.
fn index_spec(model: &IndexModel) -> Option<IndexSpec> {
    let keys = model
        .keys
        .iter()
        .map(|(field, value)| {
            let direction = match value {
                Bson::Int32(value) => Direction::from_i32(*value),
                Bson::Int64(value) => i32::try_from(*value).ok().and_then(Direction::from_i32),
                Bson::Double(value) if *value == 1.0 => Some(Direction::Ascending),
                Bson::Double(value) if *value == -1.0 => Some(Direction::Descending),
                _ => None,
            }?;
            Some(IndexKey {
                field: field.clone(),
                direction,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    let unique = model
        .options
        .as_ref()
        .and_then(|options| options.unique)
        .unwrap_or(false);

    Some(IndexSpec { keys, unique })
}

fn command_code(err: &Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        _ => None,
    }
}

/// Map a driver error onto the administrative error taxonomy.
fn classify(err: Error) -> AdminError {
    classify_with(err, classify_code)
}

/// `createUser` reports an existing user as a duplicate key on older servers.
fn classify_user(err: Error) -> AdminError {
    classify_with(err, classify_user_code)
}

fn classify_with(err: Error, by_code: fn(i32, String) -> AdminError) -> AdminError {
    let message = err.to_string();
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => AdminError::Connectivity(message),
        ErrorKind::Authentication { .. } => AdminError::Unauthorized(message),
        ErrorKind::Command(command) => by_code(command.code, message),
        _ => AdminError::Server(message),
    }
}

fn classify_code(code: i32, message: String) -> AdminError {
    match code {
        UNAUTHORIZED | AUTHENTICATION_FAILED => AdminError::Unauthorized(message),
        NAMESPACE_EXISTS
        | INDEX_ALREADY_EXISTS
        | INDEX_OPTIONS_CONFLICT
        | INDEX_KEY_SPECS_CONFLICT
        | USER_ALREADY_EXISTS => AdminError::AlreadyExists(message),
        // Existing documents block a unique index build.
        DUPLICATE_KEY => AdminError::ConstraintViolation(message),
        _ => AdminError::Server(message),
    }
}

fn classify_user_code(code: i32, message: String) -> AdminError {
    match code {
        DUPLICATE_KEY => AdminError::AlreadyExists(message),
        _ => classify_code(code, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_model_carries_name_and_uniqueness() {
        let model = index_model(&IndexSpec::unique("email"));
        assert_eq!(model.keys, doc! { "email": 1 });

        let options = model.options.unwrap();
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.name.as_deref(), Some("email_1"));
    }

    #[test]
    fn server_index_converts_back_to_spec() {
        let model = IndexModel::builder()
            .keys(doc! { "customer_id": 1_i64, "placed_at": -1.0 })
            .build();
        let spec = index_spec(&model).unwrap();
        assert!(!spec.unique);
        assert_eq!(spec.name(), "customer_id_1_placed_at_-1");
    }

    #[test]
    fn text_index_is_not_representable() {
        let model = IndexModel::builder()
            .keys(doc! { "comment": "text" })
            .build();
        assert!(index_spec(&model).is_none());
    }

    #[test]
    fn fractional_key_values_have_no_direction() {
        let model = IndexModel::builder().keys(doc! { "price": 1.5 }).build();
        assert!(index_spec(&model).is_none());

        let model = IndexModel::builder().keys(doc! { "price": -0.5 }).build();
        assert!(index_spec(&model).is_none());

        let model = IndexModel::builder().keys(doc! { "price": -1.0 }).build();
        assert_eq!(index_spec(&model).unwrap().name(), "price_-1");
    }

    #[test]
    fn listing_names_non_directional_indexes() {
        let models = vec![
            IndexModel::builder().keys(doc! { "_id": 1 }).build(),
            index_model(&IndexSpec::unique("product_id")),
            IndexModel::builder()
                .keys(doc! { "product_name": "text" })
                .options(
                    IndexOptions::builder()
                        .name("product_name_text".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "brand": "hashed" })
                .build(),
        ];

        let listing = index_listing("products", &models);
        assert_eq!(listing.indexes, vec![IndexSpec::unique("product_id")]);
        assert_eq!(listing.other.len(), 2);
        assert_eq!(listing.other[0], "product_name_text");
        assert!(listing.other[1].contains("hashed"));
    }

    #[test]
    fn options_other_than_uniqueness_are_not_compared() {
        let model = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .sparse(true)
                    .partial_filter_expression(doc! { "email": { "$exists": true } })
                    .build(),
            )
            .build();
        assert_eq!(index_spec(&model), Some(IndexSpec::unique("email")));
    }

    #[test]
    fn id_index_is_recognized() {
        let model = IndexModel::builder().keys(doc! { "_id": 1 }).build();
        assert!(is_id_index(&model));
        assert!(!is_id_index(&index_model(&IndexSpec::unique("review_id"))));
    }

    #[test]
    fn command_codes_map_to_taxonomy() {
        assert!(classify_code(NAMESPACE_EXISTS, String::new()).is_already_exists());
        assert!(classify_code(USER_ALREADY_EXISTS, String::new()).is_already_exists());
        assert!(classify_code(INDEX_OPTIONS_CONFLICT, String::new()).is_already_exists());
        assert_eq!(
            classify_code(UNAUTHORIZED, "no".to_string()),
            AdminError::Unauthorized("no".to_string())
        );
        assert_eq!(
            classify_code(2, "bad value".to_string()),
            AdminError::Server("bad value".to_string())
        );
    }

    #[test]
    fn duplicate_key_is_a_conflict_only_for_users() {
        let message = "E11000 duplicate key error collection: shop.customers index: email_1 dup key";
        assert_eq!(
            classify_code(DUPLICATE_KEY, message.to_string()),
            AdminError::ConstraintViolation(message.to_string())
        );
        assert!(!classify_code(DUPLICATE_KEY, message.to_string()).is_already_exists());

        assert!(classify_user_code(DUPLICATE_KEY, String::new()).is_already_exists());
        assert!(classify_user_code(USER_ALREADY_EXISTS, String::new()).is_already_exists());
        assert_eq!(
            classify_user_code(UNAUTHORIZED, "no".to_string()),
            AdminError::Unauthorized("no".to_string())
        );
    }
}
