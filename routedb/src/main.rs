//! Route storage demonstration client.
//!
//! Connects to a MongoDB-compatible cluster (Amazon DocumentDB in
//! production), stores a sample routing-table entry, reads it back and clears
//! the collection again.
//!
//! # Security Guarantees
//! - Passwords come from the environment or a hidden prompt, never from logs
//! - Connection targets are logged with credentials redacted
//! - TLS certificate validation is only skipped when asked for

mod route;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use route::Route;
use routedb_core::bson::{Bson, Document, doc};
use routedb_core::{
    Credentials, LogFormat, ReadPreference, RouteDbError, Session, SessionConfig, init_logging,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "routedb")]
#[command(about = "Route storage demonstration client for MongoDB/DocumentDB")]
#[command(version)]
#[command(long_about = "
routedb - store routing-table entries in a document database

Connects over TLS to a MongoDB-compatible cluster, inserts a sample route,
queries it back and deletes every document in the collection.

SECURITY FEATURES:
- Password read from ROUTEDB_PASSWORD or a hidden prompt
- Credentials redacted in all log output
- Certificate validation on unless --tls-allow-invalid-hostnames is given

EXAMPLES:
  routedb --username docdb --endpoint 127.0.0.1:27017 --replica-set rs0 \\
      --ca-file rds-combined-ca-cn-bundle.pem run
  routedb --no-tls --username root ping
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Insert the sample route, query it back and clear the collection
    Run(RunArgs),
    /// Test the database connection
    Ping,
}

#[derive(Args, Default)]
struct RunArgs {
    /// Also write the query results to this file as JSON
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    quiet: bool,

    /// Log line format
    #[arg(long, global = true, default_value = "text", help = "Log format (text or json)")]
    log_format: LogFormat,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Database username
    #[arg(long, env = "ROUTEDB_USERNAME")]
    username: String,

    /// Database password (prompted for when absent)
    #[arg(long, env = "ROUTEDB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Cluster endpoint
    #[arg(long, env = "ROUTEDB_ENDPOINT", default_value = "127.0.0.1:27017")]
    endpoint: String,

    /// Disable TLS
    #[arg(long)]
    no_tls: bool,

    /// Skip certificate and hostname validation (insecure)
    #[arg(long = "tls-allow-invalid-hostnames")]
    tls_insecure: bool,

    /// PEM bundle of trusted certificate authorities
    #[arg(long, env = "ROUTEDB_CA_FILE", value_name = "FILE")]
    ca_file: Option<PathBuf>,

    /// Connect to the endpoint directly instead of discovering the topology
    #[arg(
        long,
        env = "ROUTEDB_DIRECT_CONNECTION",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    direct_connection: bool,

    /// Replica set name
    #[arg(long, env = "ROUTEDB_REPLICA_SET")]
    replica_set: Option<String>,

    /// Which members to read from
    #[arg(long, default_value = "secondaryPreferred")]
    read_preference: ReadPreference,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = 5)]
    connect_timeout: u64,

    /// Per-operation timeout in seconds
    #[arg(long, default_value_t = 30)]
    query_timeout: u64,

    /// Database holding the route collection
    #[arg(long, default_value = "sample-database")]
    database: String,

    /// Route collection name
    #[arg(long, default_value = "collection")]
    collection: String,
}

impl ConnectionArgs {
    /// Builds a session configuration, prompting for the password if needed.
    fn to_config(&self) -> routedb_core::Result<SessionConfig> {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt_password(&self.username)?,
        };
        Ok(self.config_with_password(password))
    }

    fn config_with_password(&self, password: String) -> SessionConfig {
        let mut config = SessionConfig::new(
            self.endpoint.clone(),
            Credentials::new(self.username.clone(), password),
        )
        .with_tls(!self.no_tls)
        .with_tls_insecure(self.tls_insecure)
        .with_direct_connection(self.direct_connection)
        .with_read_preference(self.read_preference)
        .with_connect_timeout(Duration::from_secs(self.connect_timeout))
        .with_query_timeout(Duration::from_secs(self.query_timeout));

        if let Some(replica_set) = &self.replica_set {
            config = config.with_replica_set(replica_set.clone());
        }
        if let Some(ca_file) = &self.ca_file {
            config = config.with_ca_file(ca_file.clone());
        }
        config
    }
}

/// Reads the database password without echoing it.
fn prompt_password(username: &str) -> routedb_core::Result<String> {
    use std::io::{self, Write};

    print!("Enter password for {}: ", username);
    io::stdout().flush().map_err(|e| {
        RouteDbError::configuration(format!(
            "Failed to flush stdout before reading password: {}",
            e
        ))
    })?;

    let password = rpassword::read_password()
        .map_err(|e| RouteDbError::configuration(format!("Failed to read password: {}", e)))?;

    if password.is_empty() {
        return Err(RouteDbError::configuration("Password cannot be empty"));
    }
    Ok(password)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet, cli.global.log_format)?;

    let config = cli.connection.to_config()?;

    let session = Session::connect(config).await.map_err(|e| {
        error!("Failed to connect: {}", e);
        e
    })?;

    let outcome = match cli.command.unwrap_or_else(|| Command::Run(RunArgs::default())) {
        Command::Run(args) => {
            run_demo(
                &session,
                &cli.connection.database,
                &cli.connection.collection,
                args.output.as_deref(),
            )
            .await
        }
        Command::Ping => {
            info!("✓ Connection test successful");
            println!("Connection to {} successful", session.config().endpoint);
            Ok(())
        }
    };

    session.shutdown().await;
    outcome
}

/// Inserts the sample route, queries by gateway and clears the collection.
async fn run_demo(
    session: &Session,
    database: &str,
    collection: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let routes = session.collection::<Route>(database, collection);

    let inserted_id = session
        .insert_one(&routes, &Route::sample())
        .await
        .context("Failed to insert documents")?;
    info!("InsertedID: {}", inserted_id);

    let results = session
        .find_many(&routes, doc! { "gateway": "0.0.0.0" }, None)
        .await
        .context("Failed to retrieve documents")?;

    let json = results_to_json(results)?;
    info!("results: {}", json);
    println!("{}", json);

    if let Some(path) = output {
        save_results(&json, path).await?;
        info!("✓ Results saved to {}", path.display());
    }

    session
        .delete_many(&routes, doc! {})
        .await
        .context("Failed to delete documents")?;

    Ok(())
}

/// Renders documents as a relaxed extended JSON array.
fn results_to_json(results: Vec<Document>) -> routedb_core::Result<String> {
    let values = results
        .into_iter()
        .map(|document| Bson::Document(document).into_relaxed_extjson())
        .collect::<Vec<_>>();

    serde_json::to_string(&values)
        .map_err(|e| RouteDbError::serialization_failed("JSON serialization of results", e))
}

async fn save_results(json: &str, path: &Path) -> routedb_core::Result<()> {
    tokio::fs::write(path, json)
        .await
        .map_err(|e| RouteDbError::Io {
            context: format!("Failed to write results to {}", path.display()),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults_mirror_sample_deployment() {
        let cli = Cli::try_parse_from(["routedb", "--username", "docdb", "--password", "pw"])
            .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.connection.endpoint, "127.0.0.1:27017");
        assert!(cli.connection.direct_connection);
        assert_eq!(
            cli.connection.read_preference,
            ReadPreference::SecondaryPreferred
        );
        assert_eq!(cli.connection.database, "sample-database");
        assert_eq!(cli.connection.collection, "collection");
        assert_eq!(cli.global.log_format, LogFormat::Text);
    }

    #[test]
    fn test_cli_builds_session_config() {
        let cli = Cli::try_parse_from([
            "routedb",
            "--username",
            "docdb",
            "--replica-set",
            "rs0",
            "--ca-file",
            "rds-combined-ca-cn-bundle.pem",
            "--direct-connection",
            "false",
            "--read-preference",
            "nearest",
            "--connect-timeout",
            "2",
            "ping",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Command::Ping)));

        let config = cli.connection.config_with_password("prototyperoute".to_string());
        assert!(config.validate().is_ok());
        assert!(config.tls_enabled);
        assert!(!config.tls_insecure);
        assert!(!config.direct_connection);
        assert_eq!(config.replica_set.as_deref(), Some("rs0"));
        assert_eq!(config.read_preference, ReadPreference::Nearest);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(
            config.ca_file_path,
            Some(PathBuf::from("rds-combined-ca-cn-bundle.pem"))
        );
    }

    #[test]
    fn test_cli_insecure_flag_sets_tls_insecure() {
        let cli = Cli::try_parse_from([
            "routedb",
            "--username",
            "docdb",
            "--tls-allow-invalid-hostnames",
        ])
        .unwrap();

        let config = cli.connection.config_with_password("pw".to_string());
        assert!(config.tls_enabled);
        assert!(config.tls_insecure);

        let result = Cli::try_parse_from(["routedb", "--username", "docdb", "--tls-insecure"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_read_preference() {
        let result = Cli::try_parse_from([
            "routedb",
            "--username",
            "docdb",
            "--read-preference",
            "fastest",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_run_output_flag() {
        let cli = Cli::try_parse_from([
            "routedb", "--username", "docdb", "-vv", "run", "--output", "routes.json",
        ])
        .unwrap();

        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Some(Command::Run(args)) => {
                assert_eq!(args.output, Some(PathBuf::from("routes.json")));
            }
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn test_results_to_json_uses_relaxed_extended_json() {
        let json = results_to_json(vec![doc! {
            "gateway": "0.0.0.0",
            "metric": 100,
        }])
        .unwrap();

        assert_eq!(json, r#"[{"gateway":"0.0.0.0","metric":100}]"#);
    }

    #[tokio::test]
    async fn test_save_results_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");

        save_results("[]", &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");

        let missing = dir.path().join("missing").join("routes.json");
        let error = save_results("[]", &missing).await.unwrap_err();
        assert!(matches!(error, RouteDbError::Io { .. }));
    }
}
