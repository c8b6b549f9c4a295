use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml)
  DB_PATH     (default: data/kidcheck.db or config.db_path)
  PORT        (default: 3001 or config.listen_port)

Command-line flags take precedence over the environment, which takes
precedence over the config file.

The `install` command helps set up a systemd service and a default config.
Run it as root (or with sudo) for system-wide install.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "kidcheck-server",
    version,
    about = "Children's ministry check-in server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to the YAML config file (overrides CONFIG_PATH)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// SQLite database file (overrides DB_PATH and config.db_path)
    #[arg(long, value_name = "PATH")]
    pub db: Option<String>,
    /// Listen port (overrides PORT and config.listen_port)
    #[arg(long, value_name = "N")]
    pub port: Option<u16>,
    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install systemd unit + default config (run as root for system-wide)
    Install {
        /// Destination path for systemd unit
        #[arg(long, default_value = "/etc/systemd/system/kidcheck-server.service")]
        unit_path: PathBuf,
        /// Destination path for server config
        #[arg(long, default_value = "/etc/kidcheck/config.yaml")]
        config_path: PathBuf,
        /// DB path written into the unit environment
        #[arg(long, default_value = "/var/lib/kidcheck/kidcheck.db")]
        db_path: PathBuf,
        /// Absolute path to the server binary used in ExecStart
        #[arg(long)]
        bin_path: Option<PathBuf>,
        /// systemd service user
        #[arg(long, default_value = "kidcheck")]
        user: String,
        /// systemd service group
        #[arg(long, default_value = "kidcheck")]
        group: String,
        /// Working directory for the service
        #[arg(long, default_value = "/var/lib/kidcheck")]
        working_dir: PathBuf,
        /// Overwrite files if they already exist
        #[arg(long)]
        force: bool,
    },
    /// Uninstall systemd unit; optionally remove config
    Uninstall {
        /// Path to systemd unit to remove
        #[arg(long, default_value = "/etc/systemd/system/kidcheck-server.service")]
        unit_path: PathBuf,
        /// Also remove config file
        #[arg(long)]
        remove_config: bool,
        /// Path to config file
        #[arg(long, default_value = "/etc/kidcheck/config.yaml")]
        config_path: PathBuf,
    },
}
