// Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_FILE_ENV;

#[derive(Debug, Parser)]
#[command(name = "facerec-pipeline", version, about = "Run face-recognition jobs through the mediator")]
pub struct Cli {
    /// JSON config file
    #[arg(long, global = true, env = CONFIG_FILE_ENV)]
    pub config: Option<PathBuf>,

    /// Also write logs to a daily file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand, PartialEq)]
pub enum Command {
    /// Extract, cluster and search faces (default)
    Run,
    /// Print the current state of a mediator job
    Status { job_id: String },
    /// Print a signed URL for an object in the configured bucket
    Sign {
        key: String,
        /// Sign for upload (PUT) instead of download (GET)
        #[arg(long)]
        put: bool,
    },
    /// Download an object from the configured bucket
    Download { key: String, dest: PathBuf },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_is_the_default() {
        let cli = Cli::try_parse_from(["facerec-pipeline", "--config", "app.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("app.json")));
        assert_eq!(cli.command(), Command::Run);
    }

    #[test]
    fn test_config_flag_is_read() {
        let cli = Cli::try_parse_from(["facerec-pipeline", "status", "job-1", "--config", "/etc/facerec.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/facerec.json")));
    }

    #[test]
    fn test_config_falls_back_to_environment() {
        std::env::set_var(CONFIG_FILE_ENV, "/etc/facerec/env.json");
        let cli = Cli::try_parse_from(["facerec-pipeline", "run"]).unwrap();
        std::env::remove_var(CONFIG_FILE_ENV);

        assert_eq!(cli.config, Some(PathBuf::from("/etc/facerec/env.json")));
    }

    #[test]
    fn test_sign_put() {
        let cli = Cli::try_parse_from(["facerec-pipeline", "sign", "results.json", "--put"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Sign { key: "results.json".to_string(), put: true }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["facerec-pipeline", "status", "job-1", "--log-dir", "/tmp/logs"]).unwrap();
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(cli.command(), Command::Status { job_id: "job-1".to_string() });
    }
}
