use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use shopkeep_kernel::settings::{ExistingPolicy, LogFormat, Settings};

/// Provision and inspect the e-commerce MongoDB schema.
#[derive(Parser)]
#[command(name = "shopkeep", author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// What to do with users, collections and indexes that already exist
    #[arg(long, value_enum, global = true)]
    on_existing: Option<PolicyArg>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the application user, collections and indexes
    Init,

    /// Print the calls a fresh server would receive, without connecting
    Plan {
        /// Emit JSON instead of one call per line
        #[arg(long)]
        json: bool,
    },

    /// Compare the server with the catalog; exits non-zero on drift
    Verify {
        /// Emit JSON instead of one finding per line
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Inspect first, create only what is missing
    Check,
    /// Create everything, treat existing resources as satisfied
    Ignore,
    /// Create everything, abort on the first existing resource
    Fail,
}

impl From<PolicyArg> for ExistingPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Check => ExistingPolicy::Check,
            PolicyArg::Ignore => ExistingPolicy::Ignore,
            PolicyArg::Fail => ExistingPolicy::Fail,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shopkeep settings")?;
    let mut settings = shopkeep::with_policy(settings, cli.on_existing.map(Into::into));
    if let Some(format) = cli.log_format {
        settings.telemetry.log_format = match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        };
    }
    shopkeep_telemetry::init(&settings.telemetry)?;

    tracing::debug!(
        env = ?settings.environment,
        database = %settings.database.name,
        policy = %settings.provisioning.on_existing,
        "shopkeep CLI starting"
    );

    match cli.command {
        Commands::Init => {
            let report = shopkeep::bootstrap(&settings).await?;
            tracing::info!(
                created = report.created(),
                already_present = report.already_present(),
                "initialization complete"
            );
        }
        Commands::Plan { json } => {
            let calls = shopkeep::plan(&settings).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&calls)?);
            } else {
                for call in &calls {
                    println!("{}", call);
                }
            }
        }
        Commands::Verify { json } => {
            let verification = shopkeep::check(&settings).await?;
            let findings = verification.findings();
            if json {
                println!("{}", serde_json::to_string_pretty(&verification)?);
            } else {
                for finding in &findings {
                    println!("{}", finding);
                }
            }

            if !verification.is_clean() {
                bail!(
                    "schema drift detected in '{}': {} finding(s)",
                    verification.database,
                    findings.len()
                );
            }
            tracing::info!(database = %verification.database, "schema matches catalog");
        }
    }

    Ok(())
}
