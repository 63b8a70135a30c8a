use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gitfetch",
    about = "Fetch every registered git repository in parallel",
    long_about = "Fetch every registered git repository in parallel.\n\n\
                  Run without a subcommand to fetch all registered repositories.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Registry file to use instead of the per-user default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cancel the fetch run after this many seconds (0 disables)
    #[arg(long, global = true, value_name = "SECS", default_value_t = 60)]
    pub timeout: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a local repository
    Add(PathArgs),
    /// Unregister a repository
    Remove(PathArgs),
    /// List registered repositories
    List,
    /// Set the number of parallel fetch workers
    Workers(WorkersArgs),
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct WorkersArgs {
    #[arg(allow_negative_numbers = true)]
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_fetch() {
        let cli = Cli::try_parse_from(["gitfetch"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.timeout, 60);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_add() {
        let cli = Cli::try_parse_from(["gitfetch", "add", "/src/proj"]).unwrap();
        if let Some(Command::Add(args)) = cli.command {
            assert_eq!(args.path, "/src/proj");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_remove() {
        let cli = Cli::try_parse_from(["gitfetch", "remove", "/src/proj"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Remove(_))));
    }

    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["gitfetch", "list"]).unwrap();
        assert!(matches!(cli.command, Some(Command::List)));
    }

    #[test]
    fn parse_workers() {
        let cli = Cli::try_parse_from(["gitfetch", "workers", "4"]).unwrap();
        if let Some(Command::Workers(args)) = cli.command {
            assert_eq!(args.count, 4);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn negative_workers_reach_validation() {
        let cli = Cli::try_parse_from(["gitfetch", "workers", "-2"]).unwrap();
        if let Some(Command::Workers(args)) = cli.command {
            assert_eq!(args.count, -2);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn workers_requires_a_number() {
        assert!(Cli::try_parse_from(["gitfetch", "workers", "many"]).is_err());
        assert!(Cli::try_parse_from(["gitfetch", "workers"]).is_err());
    }

    #[test]
    fn add_requires_a_path() {
        assert!(Cli::try_parse_from(["gitfetch", "add"]).is_err());
    }

    #[test]
    fn global_flags() {
        let cli = Cli::try_parse_from([
            "gitfetch", "--format", "json", "--timeout", "5", "--config", "/tmp/r.json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.timeout, 5);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.json")));
        assert!(cli.verbose);
    }

    #[test]
    fn help_is_a_subcommand() {
        let err = Cli::try_parse_from(["gitfetch", "help"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
