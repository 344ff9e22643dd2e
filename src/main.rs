use anyhow::Context;
use shopkeep_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load shopkeep settings")?;
    shopkeep_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        database = %settings.database.name,
        policy = %settings.provisioning.on_existing,
        "shopkeep-init starting"
    );

    let report = shopkeep::bootstrap(&settings).await?;

    tracing::info!(
        created = report.created(),
        already_present = report.already_present(),
        "shopkeep-init complete"
    );
    Ok(())
}
