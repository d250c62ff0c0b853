//! Command-line arguments (`clap` derive).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "schedoputer",
    version,
    about = "Payment-gated workflow scheduler.",
    long_about = None
)]
pub struct Cli {
    /// Path to the config file (TOML).
    ///
    /// Default: `schedoputer.toml` in the current directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level. If omitted, `SCHEDOPUTER_LOG` or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the discovery challenge a caller would receive.
    Challenge,

    /// Create one job and drive it through simulated scheduler ticks.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long)]
    pub prompt: String,

    /// Delay before the job starts, `H:M`.
    #[arg(long, default_value = "0:00")]
    pub schedule: String,

    /// Payment proof sent as `X-PAYMENT`. Without it the job is refused.
    #[arg(long, value_name = "PROOF")]
    pub payment: Option<String>,

    /// Maximum number of ticks to run.
    #[arg(long, default_value_t = 20)]
    pub ticks: u32,

    /// Real time to sleep between ticks, in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub tick_ms: u64,

    /// Approve a waiting human task after this many ticks.
    #[arg(long, default_value_t = 1)]
    pub approve_after: u32,

    /// Call the configured HTTP endpoints instead of the local echo resource.
    #[arg(long)]
    pub live: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["schedoputer", "run", "--prompt", "hello"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.prompt, "hello");
        assert_eq!(args.schedule, "0:00");
        assert_eq!(args.ticks, 20);
        assert_eq!(args.approve_after, 1);
        assert!(args.payment.is_none());
        assert!(!args.live);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "schedoputer",
            "challenge",
            "--config",
            "alt.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Challenge));
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn run_requires_prompt() {
        assert!(Cli::try_parse_from(["schedoputer", "run"]).is_err());
    }
}
