use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "table-sniper")]
#[command(about = "Polls restaurant availability and books the closest slot")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "table-sniper.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Wait for the start time, poll until a slot opens, then book it
    Run {
        /// Stop after selecting a slot without booking it
        #[arg(long)]
        dry_run: bool,

        /// Override polling.max_attempts from config
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Query availability once and show the slot that would be chosen
    Check,
    /// Look up the restaurant name behind the configured restaurant id
    Lookup {
        /// Referer header copied from the restaurant page
        #[arg(long)]
        referer: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_overrides() {
        let args = CliArgs::parse_from([
            "table-sniper",
            "--config",
            "sabayon.toml",
            "-v",
            "run",
            "--dry-run",
            "--max-attempts",
            "30",
        ]);

        assert_eq!(args.config, "sabayon.toml");
        assert!(args.verbose);
        match args.command {
            Command::Run {
                dry_run,
                max_attempts,
            } => {
                assert!(dry_run);
                assert_eq!(max_attempts, Some(30));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let args = CliArgs::parse_from(["table-sniper", "lookup"]);
        assert_eq!(args.config, "table-sniper.toml");
        assert!(matches!(args.command, Command::Lookup { referer: None }));
    }
}
