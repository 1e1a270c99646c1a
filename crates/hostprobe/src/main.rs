//! hostprobe - Audit bridges, key files and X.509 certificates on a host.

mod checks;
mod target;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hostprobe_common::Timestamp;
use hostprobe_probes::{Bridge, KeyPair, X509Certificate};
use hostprobe_report::schema::{EXEC_FULL_SCHEMA, EXEC_MIN_SCHEMA};
use hostprobe_report::{validate_min_report, validate_report, Report};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use target::{TargetConfig, TargetKind};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hostprobe")]
#[command(
    author,
    version,
    about = "Audit network bridges, key files and X.509 certificates on a host"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Target kind (local, ssh)
    #[arg(long, global = true, default_value = "local")]
    target: TargetKind,

    /// Remote host (hostname or IP) for an ssh target
    #[arg(long, global = true)]
    host: Option<String>,

    /// SSH port
    #[arg(long, global = true, default_value = "22")]
    ssh_port: u16,

    /// SSH user
    #[arg(long, global = true)]
    ssh_user: Option<String>,

    /// SSH private key path
    #[arg(long, global = true)]
    ssh_key: Option<PathBuf>,

    /// SSH password (not recommended, use key-based auth)
    #[arg(long, global = true)]
    ssh_password: Option<String>,

    /// Report format
    #[arg(long, global = true, value_enum, default_value = "full")]
    format: Format,

    /// Print the gathered facts instead of a report
    #[arg(long, global = true)]
    facts: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Full,
    Min,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a network bridge exists and has the given interfaces
    Bridge {
        /// Bridge name
        name: String,

        /// Interface expected on the bridge (repeatable)
        #[arg(long = "interface")]
        interfaces: Vec<String>,
    },

    /// Check that a key file holds a valid private key
    RsaKey {
        /// Key file path on the target
        path: String,

        /// Passphrase for an encrypted key
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Check that a certificate file is valid
    X509 {
        /// Certificate file path on the target
        path: String,

        /// Minimum remaining validity in days
        #[arg(long)]
        min_validity_days: Option<f64>,
    },

    /// Print the JSON Schema of the report
    Schema {
        /// Print the minimal report schema
        #[arg(long)]
        min: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let config = TargetConfig {
        kind: cli.target,
        host: cli.host,
        ssh_port: cli.ssh_port,
        ssh_user: cli.ssh_user,
        ssh_key: cli.ssh_key,
        ssh_password: cli.ssh_password,
    };
    let started = Timestamp::now();

    let (control, facts) = match cli.command {
        Commands::Schema { min } => {
            println!("{}", if min { EXEC_MIN_SCHEMA } else { EXEC_FULL_SCHEMA });
            return Ok(0);
        }
        Commands::Bridge { name, interfaces } => {
            info!("Probing bridge {}", name);
            let bridge = Bridge::new(config.connect()?, name);
            (
                checks::bridge_control(&bridge, &interfaces),
                checks::bridge_facts(&bridge),
            )
        }
        Commands::RsaKey { path, passphrase } => {
            info!("Probing key {}", path);
            let host = config.connect()?;
            let key = match passphrase {
                Some(passphrase) => KeyPair::with_passphrase(host, path, passphrase),
                None => KeyPair::new(host, path),
            };
            (checks::key_control(&key), checks::key_facts(&key))
        }
        Commands::X509 {
            path,
            min_validity_days,
        } => {
            info!("Probing certificate {}", path);
            let cert = X509Certificate::new(config.connect()?, path);
            (
                checks::certificate_control(&cert, min_validity_days),
                checks::certificate_facts(&cert),
            )
        }
    };

    let report = checks::build_report(vec![control], started);
    let code = checks::exit_code(&report);

    if cli.facts {
        print_json(&facts)?;
    } else {
        print_report(&report, cli.format)?;
    }

    info!("Finished with exit code {}", code);
    Ok(code as u8)
}

fn print_report(report: &Report, format: Format) -> Result<()> {
    let (document, validation) = match format {
        Format::Full => (
            serde_json::to_value(report)?,
            validate_report(report).context("Failed to validate report")?,
        ),
        Format::Min => {
            let min = report.to_min();
            (
                serde_json::to_value(&min)?,
                validate_min_report(&min).context("Failed to validate report")?,
            )
        }
    };

    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    if !validation.valid {
        for e in &validation.errors {
            error!("{}", e);
        }
        bail!("Report does not match its schema");
    }

    print_json(&document)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
