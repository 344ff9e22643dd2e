//! shopkeep: provisions the e-commerce MongoDB schema.
//!
//! The catalog lives in [`modules`]; this crate wires it to settings and to
//! either a live server ([`bootstrap`], [`check`]) or an in-memory one
//! ([`plan`]).

pub mod modules;

use anyhow::Context;
use shopkeep_db::MongoAdmin;
use shopkeep_kernel::{
    AdminCall, AppUser, ExistingPolicy, InitReport, MemoryAdmin, ModuleRegistry, Password,
    SchemaInitializer, Settings, Verification,
};

/// Registry with every e-commerce collection registered.
pub fn catalog() -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry).with_context(|| "failed to register modules")?;
    Ok(registry)
}

/// Initializer for the configured database, user and policy.
pub fn initializer(settings: &Settings, user: AppUser) -> anyhow::Result<SchemaInitializer> {
    Ok(SchemaInitializer::new(
        settings.database.name.clone(),
        user,
        catalog()?.collect_collections(),
    )
    .with_policy(settings.provisioning.on_existing))
}

/// Provision the live server once.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<InitReport> {
    let user = settings
        .app_user
        .resolve(&settings.database.name)
        .with_context(|| "invalid application user configuration")?;
    let initializer = initializer(settings, user)?;

    let mut admin = MongoAdmin::connect(&settings.database)
        .await
        .with_context(|| format!("failed to connect to {}", redact_uri(&settings.database.uri)))?;

    let report = initializer.run(&mut admin).await?;
    Ok(report)
}

/// Calls a fresh server would receive, computed without contacting one.
pub async fn plan(settings: &Settings) -> anyhow::Result<Vec<AdminCall>> {
    let initializer = initializer(settings, placeholder_user(settings))?;

    let mut admin = MemoryAdmin::new();
    initializer.run(&mut admin).await?;

    Ok(admin.mutations().into_iter().cloned().collect())
}

/// Compare the live server with the catalog.
pub async fn check(settings: &Settings) -> anyhow::Result<Verification> {
    let initializer = initializer(settings, placeholder_user(settings))?;

    let mut admin = MongoAdmin::connect(&settings.database)
        .await
        .with_context(|| format!("failed to connect to {}", redact_uri(&settings.database.uri)))?;

    let verification = shopkeep_kernel::verify(&initializer, &mut admin).await?;
    Ok(verification)
}

/// Policy override applied on top of loaded settings.
pub fn with_policy(mut settings: Settings, policy: Option<ExistingPolicy>) -> Settings {
    if let Some(policy) = policy {
        settings.provisioning.on_existing = policy;
    }
    settings
}

// Planning and verification never send the password.
fn placeholder_user(settings: &Settings) -> AppUser {
    AppUser::read_write(
        settings.app_user.username.clone(),
        Password::new(String::new()),
        &settings.database.name,
    )
}

/// Strip credentials from a connection string before it reaches logs.
fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://<credentials>{}", &uri[..scheme_end], &uri[at..])
        }
        _ => uri.to_string(),
    }
}
