//! User Policy Admin CLI
//!
//! Manages user-to-policy mappings stored in PostgreSQL by routing each
//! command through the same backend handlers a host would use.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (or `--database-url`)
//! - `DB_MAX_CONNECTIONS` and friends: pool settings, see `PostgresConfig`
//! - `RUST_LOG`: Log level filter (default: user_policy_admin=info,sqlx=warn)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... cargo run --bin user_policy_admin --features cli -- write alice --policies dev,ops
//! ```

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use user_policy_store::{
    Backend, Operation, PostgresConfig, PostgresStorage, Request, RequestContext,
    USER_PATH_PREFIX,
};

#[derive(Parser)]
#[command(
    name = "user_policy_admin",
    version,
    about = "Manage user-to-policy mappings"
)]
struct Cli {
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Create the entries table before running the command.
    #[arg(long, global = true)]
    create_schema: bool,

    /// Seconds to wait for the database connection.
    #[arg(long, default_value_t = 30, global = true)]
    connect_timeout: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all user names
    List,
    /// Show the policies of a user
    Read {
        /// User name.
        name: String,
    },
    /// Create or replace a user's policies
    Write {
        /// User name.
        name: String,
        /// Comma-separated policy names.
        #[arg(long, default_value = "")]
        policies: String,
    },
    /// Delete a user
    Delete {
        /// User name.
        name: String,
    },
    /// Describe the user paths
    Describe,
}

impl Command {
    fn into_request(self) -> Request {
        let users = |name: &str| format!("{}/{}", USER_PATH_PREFIX, name);
        match self {
            Self::List => Request::new(Operation::List, users("")),
            Self::Read { name } => Request::new(Operation::Read, users(&name)),
            Self::Write { name, policies } => {
                Request::new(Operation::Update, users(&name)).with_field("policies", policies)
            }
            Self::Delete { name } => Request::new(Operation::Delete, users(&name)),
            Self::Describe => Request::new(Operation::Help, users("")),
        }
    }
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "user_policy_admin=info,user_policy_store=info,sqlx=warn".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = PostgresConfig::from_env();
    if let Some(url) = cli.database_url {
        config = config.with_database_url(url);
    }

    let connect_start = Instant::now();
    let storage = match tokio::time::timeout(
        Duration::from_secs(cli.connect_timeout),
        PostgresStorage::new(config),
    )
    .await
    {
        Ok(Ok(storage)) => storage,
        Ok(Err(e)) => {
            error!(error = %e, "Failed to connect to PostgreSQL");
            return Err(e.into());
        }
        Err(_) => {
            error!(timeout_secs = cli.connect_timeout, "PostgreSQL connection timeout");
            return Err("Database connection timeout".into());
        }
    };
    info!(
        latency_ms = connect_start.elapsed().as_millis() as u64,
        "PostgreSQL connection established"
    );

    if cli.create_schema {
        storage.ensure_schema().await?;
        info!("Entries table ready");
    }

    let backend = Backend::new()?;
    let ctx = RequestContext::new();

    let cancel = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(request_id = %cancel.request_id(), "Received Ctrl+C, cancelling request");
            cancel.cancel();
        }
    });

    let request = cli.cmd.into_request();
    let is_read = request.operation == Operation::Read;

    match backend.handle_request(&ctx, &storage, &request).await {
        Ok(Some(response)) => {
            println!("{}", serde_json::to_string_pretty(&response.data)?);
        }
        Ok(None) if is_read => {
            eprintln!("No entry at {}", request.path);
            std::process::exit(1);
        }
        Ok(None) => {
            info!(request_id = %ctx.request_id(), path = %request.path, "Success");
        }
        Err(e) => {
            error!(
                request_id = %ctx.request_id(),
                error = %e,
                request_error = e.is_request_error(),
                "Request failed"
            );
            return Err(e.into());
        }
    }

    Ok(())
}
