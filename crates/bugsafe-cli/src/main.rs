//! bugsafe - redact secrets from failure output and package it into
//! verifiable bug bundles.

use bugsafe_cli::commands::{self, PackOptions};
use bugsafe_cli::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use bugsafe_cli::{CliError, ExitCode};
use bugsafe_config::{load, ConfigLayer, LoadOptions, ResolvedConfig};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::error;

/// Redact secrets and build safe, verifiable bug bundles
#[derive(Parser)]
#[command(name = "bugsafe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log format on stderr: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// User config file (replaces $BUGSAFE_CONFIG and the default location)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip patterns below this priority (0-100)
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(0..=100))]
    min_priority: Option<u8>,

    /// Do not redact email addresses
    #[arg(long, global = true)]
    no_emails: bool,

    /// Do not redact IP addresses
    #[arg(long, global = true)]
    no_ips: bool,

    /// Redact UUIDs
    #[arg(long, global = true)]
    uuids: bool,

    /// Per-pattern evaluation deadline in milliseconds (0 disables)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

impl GlobalOpts {
    fn log_config(&self) -> LogConfig {
        let level = if self.quiet {
            Some(LogLevel::Error)
        } else {
            match self.verbose {
                0 => None,
                1 => Some(LogLevel::Debug),
                _ => Some(LogLevel::Trace),
            }
        };
        LogConfig::from_env(level, self.log_format)
    }

    /// Flags as the highest-precedence config layer.
    fn cli_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        let r = &mut layer.redaction;
        r.min_priority = self.min_priority;
        r.redact_emails = self.no_emails.then_some(false);
        r.redact_ips = self.no_ips.then_some(false);
        r.redact_uuids = self.uuids.then_some(true);
        r.timeout_ms = self.timeout_ms;
        layer
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Redact a file or stdin and print the result
    Redact(RedactArgs),

    /// Scan a bundle or text file for unredacted secrets
    Audit(AuditArgs),

    /// Redact captured output and write a bug bundle
    Pack(PackArgs),

    /// Show a bundle's manifest and integrity status
    Inspect(InspectArgs),

    /// Verify a bundle and extract it
    Extract(ExtractArgs),

    /// Show or create configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// Input file (stdin when omitted or "-")
    file: Option<PathBuf>,

    /// Print the redaction report to stderr as JSON
    #[arg(long)]
    summary: bool,
}

#[derive(Args, Debug)]
struct AuditArgs {
    /// Bundle or text file
    path: PathBuf,
}

#[derive(Args, Debug)]
struct PackArgs {
    /// Bundle to create
    #[arg(short, long, value_name = "BUNDLE")]
    output: PathBuf,

    /// Captured standard output
    #[arg(long, value_name = "FILE")]
    stdout: Option<PathBuf>,

    /// Captured standard error
    #[arg(long, value_name = "FILE")]
    stderr: Option<PathBuf>,

    /// Traceback as JSON
    #[arg(long, value_name = "FILE")]
    traceback: Option<PathBuf>,

    /// Environment snapshot as JSON
    #[arg(long, value_name = "FILE", conflicts_with = "capture_env")]
    environment: Option<PathBuf>,

    /// Snapshot the current environment (variables, cwd, git, platform)
    #[arg(long)]
    capture_env: bool,

    /// Command that failed
    #[arg(long, value_name = "ARG", num_args = 1.., allow_hyphen_values = true)]
    command: Vec<String>,

    /// Exit code of the failed command
    #[arg(long, requires = "command", allow_negative_numbers = true)]
    exit_code: Option<i32>,

    /// Wall time of the failed command
    #[arg(long, requires = "command")]
    duration_ms: Option<u64>,

    /// Extra text files to include (repeatable)
    #[arg(long, value_name = "FILE")]
    attach: Vec<PathBuf>,

    /// Refuse to write if any entry still contains a detectable secret
    #[arg(long)]
    self_check: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    bundle: PathBuf,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    bundle: PathBuf,

    /// Destination directory
    dir: PathBuf,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Print effective configuration and where each value came from (default)
    #[arg(long, conflicts_with_all = ["path", "init"])]
    show: bool,

    /// Print the config file locations
    #[arg(long, conflicts_with = "init")]
    path: bool,

    /// Write a commented config file to --config or the user location
    #[arg(long)]
    init: bool,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    init_logging(&cli.global.log_config());

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            let code = e.exit_code();
            error!(code = %code, "{}", e);
            eprintln!("bugsafe: {}", e);
            code
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let explicit_config = cli.global.config.as_deref();

    let code = match &cli.command {
        Commands::Config(args) if args.init => commands::config_init(explicit_config, &mut out)?,
        Commands::Config(args) if args.path => commands::config_paths(explicit_config, &mut out)?,
        command => {
            let config = resolve(&cli.global)?;
            dispatch(command, &config, &mut out)?
        }
    };
    out.flush().map_err(CliError::Output)?;
    Ok(code)
}

fn resolve(global: &GlobalOpts) -> Result<ResolvedConfig, CliError> {
    Ok(load(&LoadOptions {
        config_path: global.config.clone(),
        cwd: None,
        cli: global.cli_layer(),
    })?)
}

fn dispatch(
    command: &Commands,
    config: &ResolvedConfig,
    out: &mut dyn Write,
) -> Result<ExitCode, CliError> {
    match command {
        Commands::Redact(args) => commands::redact(
            config,
            args.file.as_deref(),
            args.summary,
            out,
            &mut std::io::stderr(),
        ),
        Commands::Audit(args) => commands::audit_path(config, &args.path, out),
        Commands::Pack(args) => commands::pack(config, &pack_options(args), out),
        Commands::Inspect(args) => commands::inspect(config, &args.bundle, out),
        Commands::Extract(args) => commands::extract_bundle(config, &args.bundle, &args.dir, out),
        Commands::Config(_) => commands::config_show(config, out),
    }
}

fn pack_options(args: &PackArgs) -> PackOptions {
    PackOptions {
        output: args.output.clone(),
        stdout: args.stdout.clone(),
        stderr: args.stderr.clone(),
        traceback: args.traceback.clone(),
        environment: args.environment.clone(),
        capture_env: args.capture_env,
        command: args.command.clone(),
        exit_code: args.exit_code,
        duration_ms: args.duration_ms,
        attach: args.attach.clone(),
        self_check: args.self_check,
    }
}
