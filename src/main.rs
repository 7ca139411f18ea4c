use clap::Parser;
use digfoot::cli::{self, Cli, Commands};
use digfoot::config;
use digfoot::errors::DigfootError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.with_ansi(!cli.no_color).init();
    }

    let quiet = cli.quiet;
    let result = match cli.command {
        Some(Commands::Scan(args)) => run_scan(&args.email, args.options, quiet).await,
        Some(Commands::Variations(args)) => cli::variations::handle_variations(args),
        Some(Commands::Validate(args)) => handle_validate(args).await,
        None => match cli.email {
            Some(email) => run_scan(&email, cli.scan, quiet).await,
            None => Err(DigfootError::InvalidEmail("no address given".into())),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            DigfootError::Config(_) | DigfootError::Yaml(_) => 2,
            DigfootError::InvalidEmail(_) => 5,
            DigfootError::Cancelled(_) => 130,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn run_scan(email: &str, options: cli::commands::ScanOptions, quiet: bool) -> Result<(), DigfootError> {
    let summary = cli::scan::handle_scan(email, options, quiet).await?;
    if summary.interrupted() {
        return Err(DigfootError::Cancelled(format!(
            "scan interrupted, partial results saved to {}",
            summary.report_path.display()
        )));
    }
    Ok(())
}

async fn handle_validate(args: cli::commands::ValidateArgs) -> Result<(), DigfootError> {
    let path = std::path::PathBuf::from(&args.config);
    let _config = config::parse_config(&path).await?;
    println!("Configuration is valid: {}", args.config);
    Ok(())
}
