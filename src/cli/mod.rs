//! # moviectl
//!
//! Command-line interface for the Movie Rating Controller.
//!
//! ## Usage
//!
//! ```bash
//! # List Movies resources in the current namespace
//! moviectl list
//!
//! # List across all namespaces
//! moviectl list --all-namespaces
//!
//! # Show a resource, its unit name and the unit's phase
//! moviectl status inception -n media
//!
//! # Print the deterministic unit name (no cluster access)
//! moviectl unit-name inception -n media
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;

mod list;
mod status;
mod unit_name;

/// Movie Rating Controller CLI
#[derive(Parser)]
#[command(name = "moviectl")]
#[command(
    about = "Movie Rating Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  moviectl list --all-namespaces
  moviectl status inception -n media
  moviectl unit-name inception -n media
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List Movies resources with their ratings
    List {
        /// Namespace to list (defaults to the client's namespace)
        #[arg(short, long, conflicts_with = "all_namespaces")]
        namespace: Option<String>,

        /// List across all namespaces
        #[arg(short = 'A', long)]
        all_namespaces: bool,
    },
    /// Show spec, status and execution unit of one Movies resource
    Status {
        /// Name of the Movies resource
        #[arg(value_name = "NAME")]
        name: String,

        /// Namespace of the resource
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Namespace execution units run in (defaults to EXECUTION_NAMESPACE or "default")
        #[arg(long)]
        execution_namespace: Option<String>,
    },
    /// Print the execution unit name for a resource (offline)
    #[command(name = "unit-name")]
    UnitName {
        /// Name of the Movies resource
        #[arg(value_name = "NAME")]
        name: String,

        /// Namespace of the resource
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List {
            namespace,
            all_namespaces,
        } => list::list_command(connect().await?, namespace, all_namespaces).await,
        Commands::Status {
            name,
            namespace,
            execution_namespace,
        } => {
            status::status_command(connect().await?, &name, &namespace, execution_namespace).await
        }
        // Offline, no client or crypto provider needed
        Commands::UnitName { name, namespace } => {
            println!("{}", unit_name::unit_name_command(&namespace, &name));
            Ok(())
        }
    }
}

/// Install the crypto provider and logging, then build a client from kubeconfig
async fn connect() -> Result<Client> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moviectl=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")
}
