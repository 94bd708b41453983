use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use erpgate_observability::LogFormat;

mod commands;

/// erpgate - inspect what the ERP client shows and allows for a given user
#[derive(Parser)]
#[command(name = "erpgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log format written to stderr (json, pretty)
    #[arg(long, global = true, env = "ERPGATE_LOG_FORMAT", default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Who is asking: roles and explicitly issued permissions.
#[derive(Args, Debug, Clone, Default)]
pub struct Identity {
    /// Assigned role code; repeat for several, the first is the primary role
    #[arg(short, long = "role")]
    pub roles: Vec<String>,

    /// Explicit permission code; when given, roles no longer contribute
    #[arg(short, long = "permission")]
    pub permissions: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the menu visible to a user as JSON
    Menu {
        #[command(flatten)]
        identity: Identity,

        /// Menu tree JSON file (defaults to the built-in ERP menu)
        #[arg(long)]
        menu: Option<PathBuf>,
    },

    /// Decide a navigation to PATH and print the outcome as JSON
    Check {
        /// Target path, e.g. /admin/users
        path: String,

        #[command(flatten)]
        identity: Identity,

        /// Navigate without a session
        #[arg(long, conflicts_with_all = ["roles", "permissions"])]
        anonymous: bool,

        /// Route table JSON file (defaults to the built-in ERP routes)
        #[arg(long)]
        routes: Option<PathBuf>,

        /// Navigation config JSON file; ERPGATE_* variables still apply on top
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the role catalogue with resolved permissions
    Roles,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    erpgate_observability::init_with(cli.log_format);

    match cli.command {
        Commands::Menu { identity, menu } => {
            commands::menu::execute(&identity, menu.as_deref())?;
        }
        Commands::Check {
            path,
            identity,
            anonymous,
            routes,
            config,
        } => {
            commands::check::execute(
                &path,
                &identity,
                anonymous,
                routes.as_deref(),
                config.as_deref(),
            )
            .await?;
        }
        Commands::Roles => {
            commands::roles::execute()?;
        }
    }

    Ok(())
}
