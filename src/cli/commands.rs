use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "digfoot",
    version,
    long_version = crate::LONG_VERSION,
    about = "Map the public activity linked to an email address",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Email address to scan (shorthand for `digfoot scan <EMAIL>`)
    pub email: Option<String>,

    #[command(flatten)]
    pub scan: ScanOptions,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Hide progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search platforms for activity linked to an email address
    Scan(ScanArgs),
    /// Print the usernames derived from an email address
    Variations(VariationsArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ScanArgs {
    /// Email address to scan
    pub email: String,

    #[command(flatten)]
    pub options: ScanOptions,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ScanOptions {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory for the report files
    #[arg(short, long)]
    pub output: Option<String>,

    /// Drop activity older than this (RFC 3339, YYYY-MM-DD or an age like 30d)
    #[arg(long)]
    pub since: Option<String>,

    /// Drop activity newer than this
    #[arg(long)]
    pub until: Option<String>,

    /// Only run these sources (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Skip these sources (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// How many username variations to query
    #[arg(long)]
    pub max_variations: Option<usize>,

    /// Maximum sources queried at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-source timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Also write a Markdown report
    #[arg(long)]
    pub markdown: bool,

    /// Skip the email domain reachability check
    #[arg(long)]
    pub no_domain: bool,
}

#[derive(Args, Clone, Debug)]
pub struct VariationsArgs {
    /// Email address to derive usernames from
    pub email: String,

    /// Print only the first N variations
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_email_is_scan_shorthand() {
        let cli = Cli::try_parse_from(["digfoot", "example@domain.com", "--since", "30d"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.email.as_deref(), Some("example@domain.com"));
        assert_eq!(cli.scan.since.as_deref(), Some("30d"));
    }

    #[test]
    fn test_scan_subcommand_with_lists() {
        let cli = Cli::try_parse_from([
            "digfoot", "-vv", "scan", "example@domain.com",
            "--sources", "github,reddit", "--exclude", "profiles", "--markdown",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Scan(args)) => {
                assert_eq!(args.email, "example@domain.com");
                assert_eq!(args.options.sources, Some(vec!["github".to_string(), "reddit".to_string()]));
                assert_eq!(args.options.exclude, Some(vec!["profiles".to_string()]));
                assert!(args.options.markdown);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_variations_subcommand() {
        let cli = Cli::try_parse_from(["digfoot", "variations", "bob@example.com", "-n", "2"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Variations(ref a)) if a.limit == Some(2)));
    }
}
