mod commands;
mod runtime;
mod status;
mod wiring;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pulse")]
#[command(about = "Daily content ideas and reminders for a social media creator")]
struct Cli {
    /// Start even when credentials are missing.
    #[arg(long, global = true)]
    skip_validation: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a test message to the configured number.
    Test,
    /// Generate and store ideas now without sending anything.
    Generate {
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Fetch, score and store trends now.
    Trends,
    /// Scan, check trends and send the morning message now.
    Morning,
    /// Show today's slots, ideas, the last message, trends and weights.
    Status,
    /// Resolve sent ideas and update pattern weights now.
    Feedback,
    /// Send the weekly performance report now.
    Report,
    /// Run the daily scheduler until interrupted (the default).
    Run,
}

impl Cli {
    fn requires_credentials(&self) -> bool {
        !self.skip_validation && !matches!(self.command, Some(Commands::Status))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = pulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if cli.requires_credentials() {
        let missing = config.missing_credentials();
        if !missing.is_empty() {
            anyhow::bail!(
                "missing configuration: {} (set them in .env or pass --skip-validation)",
                missing.join(", ")
            );
        }
    }

    let profile = pulse_core::load_profile(&config.profile_path)?;
    let pool_config = pulse_db::PoolConfig::from_app_config(&config);
    let pool = pulse_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = pulse_db::run_migrations(&pool).await?;
    tracing::debug!(applied, "migrations applied");

    if let Some(Commands::Status) = cli.command {
        let messaging = wiring::messaging_client(&config).ok();
        return status::run(
            &pool,
            &config,
            &profile,
            messaging
                .as_ref()
                .map(|m| m as &dyn pulse_messaging::MessagingClient),
        )
        .await;
    }

    let agent = wiring::build_agent(pool, &config, profile.clone())?;
    match cli.command {
        Some(Commands::Test) => commands::test(&agent).await,
        Some(Commands::Generate { count }) => commands::generate(&agent, count).await,
        Some(Commands::Trends) => commands::trends(&agent).await,
        Some(Commands::Morning) => commands::morning(&agent, config.timezone).await,
        Some(Commands::Feedback) => commands::feedback(&agent).await,
        Some(Commands::Report) => commands::report(&agent, config.timezone).await,
        Some(Commands::Run) | None => runtime::run(agent, &config, profile.timetable).await,
        Some(Commands::Status) => Ok(()),
    }
}

#[cfg(test)]
mod tests;
