//! homegrid — operator CLI for the component group registry.
//!
//! Every invocation opens the store, loads all groups into a registry, runs
//! one operation and exits.
//!
//! # Usage
//!
//! ```text
//! homegrid --db ./groups.redb config set kitchen '{"room":"kitchen"}'
//! homegrid --db ./groups.redb component assign kitchen light1
//! homegrid --db ./groups.redb component setting set kitchen light1 brightness 80
//! homegrid --db ./groups.redb show kitchen
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "homegrid",
    about = "homegrid — component group registry",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to homegrid.toml (defaults apply when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file. Overrides [store].path from the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all component groups
    List,
    /// Show one component group
    Show { uid: String },
    /// Print a group's settings
    Settings { uid: String },
    /// Print a group's in-memory status
    Status { uid: String },
    /// Delete a component group and its stored configuration
    Delete { uid: String },
    /// Read or write a group's configuration document
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage component assignments and their association settings
    Component {
        #[command(subcommand)]
        action: ComponentAction,
    },
    /// Manage macro assignments
    Macro {
        #[command(subcommand)]
        action: MacroAction,
    },
    /// Manage group settings
    Setting {
        #[command(subcommand)]
        action: SettingAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration document
    Get { uid: String },
    /// Write the configuration document, creating the group if needed.
    ///
    /// The document is inline JSON, or `@path` to read it from a file.
    Set { uid: String, document: String },
}

#[derive(Subcommand)]
enum ComponentAction {
    Assign { uid: String, component: String },
    Unassign { uid: String, component: String },
    /// Association settings of an assigned component
    Setting {
        #[command(subcommand)]
        action: AssociationSettingAction,
    },
}

#[derive(Subcommand)]
enum AssociationSettingAction {
    Get {
        uid: String,
        component: String,
        key: String,
    },
    /// Values are parsed as JSON and fall back to a plain string.
    Set {
        uid: String,
        component: String,
        key: String,
        value: String,
    },
    Remove {
        uid: String,
        component: String,
        key: String,
    },
}

#[derive(Subcommand)]
enum MacroAction {
    Assign {
        uid: String,
        #[arg(value_name = "MACRO")]
        macro_uid: String,
    },
    Unassign {
        uid: String,
        #[arg(value_name = "MACRO")]
        macro_uid: String,
    },
}

#[derive(Subcommand)]
enum SettingAction {
    Get { uid: String, key: String },
    /// Values are parsed as JSON and fall back to a plain string.
    Set { uid: String, key: String, value: String },
    Remove { uid: String, key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let registry = commands::open_registry(cli.config.as_deref(), cli.db.as_deref()).await?;

    match cli.command {
        Commands::List => commands::group::list(&registry).await,
        Commands::Show { uid } => commands::group::show(&registry, &uid).await,
        Commands::Settings { uid } => commands::group::settings(&registry, &uid).await,
        Commands::Status { uid } => commands::group::status(&registry, &uid).await,
        Commands::Delete { uid } => commands::group::delete(&registry, &uid).await,
        Commands::Config { action } => match action {
            ConfigAction::Get { uid } => commands::group::get_config(&registry, &uid).await,
            ConfigAction::Set { uid, document } => {
                commands::group::set_config(&registry, &uid, &document).await
            }
        },
        Commands::Component { action } => match action {
            ComponentAction::Assign { uid, component } => {
                commands::assign::assign_component(&registry, &uid, &component).await
            }
            ComponentAction::Unassign { uid, component } => {
                commands::assign::unassign_component(&registry, &uid, &component).await
            }
            ComponentAction::Setting { action } => match action {
                AssociationSettingAction::Get { uid, component, key } => {
                    commands::settings::get_association(&registry, &uid, &component, &key).await
                }
                AssociationSettingAction::Set {
                    uid,
                    component,
                    key,
                    value,
                } => {
                    commands::settings::set_association(&registry, &uid, &component, &key, &value)
                        .await
                }
                AssociationSettingAction::Remove { uid, component, key } => {
                    commands::settings::remove_association(&registry, &uid, &component, &key)
                        .await
                }
            },
        },
        Commands::Macro { action } => match action {
            MacroAction::Assign { uid, macro_uid } => {
                commands::assign::assign_macro(&registry, &uid, &macro_uid).await
            }
            MacroAction::Unassign { uid, macro_uid } => {
                commands::assign::unassign_macro(&registry, &uid, &macro_uid).await
            }
        },
        Commands::Setting { action } => match action {
            SettingAction::Get { uid, key } => {
                commands::settings::get_group(&registry, &uid, &key).await
            }
            SettingAction::Set { uid, key, value } => {
                commands::settings::set_group(&registry, &uid, &key, &value).await
            }
            SettingAction::Remove { uid, key } => {
                commands::settings::remove_group(&registry, &uid, &key).await
            }
        },
    }
}
