//! Standalone command-line interface.
//!
//! Flag spelling follows the historical camelCase names so an invocation
//! looks the same whether it goes through the host framework or this
//! binary. Boolean flags map to `Some(true)` only when given; an absent
//! flag stays `None` so the declarative layer underneath can still decide.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use offstack_config::{ClientOptions, DynamoSection, RawOptions};

#[derive(Parser, Debug)]
#[command(
    name = "offstack",
    about = "Runs an emulated DynamoDB data store and API gateway for offline development"
)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the offline stack and block until SIGINT or SIGTERM
    Start(StartArgs),

    /// Print the resolved configuration without starting anything
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Project root containing serverless.yml
        #[arg(long = "service-path", default_value = ".")]
        service_path: PathBuf,
    },
}

/// Flags of `offstack start`, one per [`RawOptions`] field.
///
/// `--sharedDb` carries no shortcut here: the historical `h` letter lives
/// in the host registry metadata, while clap keeps `-h` for help.
#[derive(Args, Debug, Clone)]
pub struct StartArgs {
    /// Gateway port. Dynamic when omitted.
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Embedded DynamoDB port. Dynamic when omitted.
    #[arg(short = 'd', long = "dynamoDbPort")]
    pub dynamo_db_port: Option<u16>,

    /// Run the database in memory; data is lost when the run ends.
    #[arg(short = 'i', long = "inMemory")]
    pub in_memory: bool,

    /// Directory where the database writes its files.
    #[arg(short = 'b', long = "dbPath")]
    pub db_path: Option<PathBuf>,

    /// Use a single database file regardless of credentials and region.
    #[arg(long = "sharedDb")]
    pub shared_db: bool,

    /// Introduce delays for transient table statuses like the real service.
    #[arg(short = 't', long = "delayTransientStatuses")]
    pub delay_transient_statuses: bool,

    /// Optimize the underlying tables before starting up.
    #[arg(short = 'o', long = "optimizeDbBeforeStartup", requires = "db_path")]
    pub optimize_db_before_startup: bool,

    /// Schema document served by the gateway.
    #[arg(long = "schemaPath")]
    pub schema_path: Option<PathBuf>,

    /// External data-store endpoint. Skips the embedded emulator.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Region reported to the data-store client.
    #[arg(long)]
    pub region: Option<String>,

    /// Access key id for the data-store client.
    #[arg(long = "accessKeyId")]
    pub access_key_id: Option<String>,

    /// Secret access key for the data-store client.
    #[arg(long = "secretAccessKey")]
    pub secret_access_key: Option<String>,

    /// Project root containing serverless.yml
    #[arg(long = "service-path", default_value = ".")]
    pub service_path: PathBuf,
}

impl StartArgs {
    /// The CLI layer of the three-way merge.
    pub fn to_raw_options(&self) -> RawOptions {
        RawOptions {
            port: self.port,
            dynamo_db_port: self.dynamo_db_port,
            in_memory: self.in_memory.then_some(true),
            db_path: self.db_path.clone(),
            shared_db: self.shared_db.then_some(true),
            delay_transient_statuses: self.delay_transient_statuses.then_some(true),
            optimize_db_before_startup: self.optimize_db_before_startup.then_some(true),
            schema_path: self.schema_path.clone(),
            dynamodb: DynamoSection {
                client: ClientOptions {
                    endpoint: self.endpoint.clone(),
                    region: self.region.clone(),
                    access_key_id: self.access_key_id.clone(),
                    secret_access_key: self.secret_access_key.clone(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn start_args(cli: Cli) -> StartArgs {
        match cli.command {
            Commands::Start(args) => args,
            other => panic!("expected start command, got {:?}", other),
        }
    }

    #[test]
    fn maps_flags_to_raw_options() {
        let args = start_args(parse(&[
            "offstack",
            "start",
            "-p",
            "1234",
            "--dynamoDbPort",
            "8000",
            "--inMemory",
            "--delayTransientStatuses",
            "--endpoint",
            "http://localhost:8000",
        ]));

        let opts = args.to_raw_options();
        assert_eq!(opts.port, Some(1234));
        assert_eq!(opts.dynamo_db_port, Some(8000));
        assert_eq!(opts.in_memory, Some(true));
        assert_eq!(opts.delay_transient_statuses, Some(true));
        assert_eq!(
            opts.dynamodb.client.endpoint.as_deref(),
            Some("http://localhost:8000")
        );
    }

    #[test]
    fn absent_boolean_flags_stay_unset() {
        // `None`, not `Some(false)`: the flag's absence must not override
        // a `true` declared in the project block.
        let opts = start_args(parse(&["offstack", "start"])).to_raw_options();
        assert_eq!(opts.in_memory, None);
        assert_eq!(opts.shared_db, None);
        assert_eq!(opts.delay_transient_statuses, None);
        assert_eq!(opts.optimize_db_before_startup, None);
        assert!(opts.is_empty());
    }

    #[test]
    fn optimize_requires_db_path() {
        let err = Cli::try_parse_from(["offstack", "start", "--optimizeDbBeforeStartup"]);
        assert!(err.is_err());

        let args = start_args(parse(&[
            "offstack",
            "start",
            "--optimizeDbBeforeStartup",
            "--dbPath",
            "/data/db",
        ]));
        assert_eq!(args.to_raw_options().optimize_db_before_startup, Some(true));
    }

    #[test]
    fn config_command_defaults_to_cwd() {
        match parse(&["offstack", "config", "--json"]).command {
            Commands::Config { json, service_path } => {
                assert!(json);
                assert_eq!(service_path, PathBuf::from("."));
            }
            other => panic!("expected config command, got {:?}", other),
        }
    }
}
