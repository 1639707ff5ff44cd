//! ovpnctl - multi-tunnel OpenVPN supervisor
//!
//! Starts one OpenVPN daemon per configuration file in the working directory
//! and relays stop, reload, reopen and status requests to all of them.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use ovpnctl_core::config::toml_config::{load_config, resolve_config_source};
use ovpnctl_core::error::SupervisorError;
use ovpnctl_core::supervisor::{DaemonBinary, Supervisor};
use ovpnctl_core::{init_logging, Level};

mod cli;

#[derive(Parser)]
#[command(name = "ovpnctl", version)]
#[command(about = "Supervise one OpenVPN daemon per configuration file")]
struct Cli {
    /// Configuration file (default: $OVPNCTL_CONFIG or /etc/ovpnctl/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the tunnel configurations
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Directory holding the PID files
    #[arg(long, value_name = "DIR")]
    pid_dir: Option<PathBuf>,

    /// Report hook and signal failures instead of ignoring them
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Launch every configured tunnel
    Start,
    /// Terminate every tracked tunnel
    Stop,
    /// Stop, then start
    Restart,
    /// Restart only if tunnels are running
    Condrestart,
    /// Send SIGHUP to every tunnel
    Reload,
    /// Send SIGUSR1 to every tunnel (reopen log files)
    Reopen,
    /// Send SIGUSR2 to every tunnel (write status to its log)
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    };

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        std::process::exit(1);
    };

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    if let Err(e) = init_logging(level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let source = resolve_config_source(cli.config.as_deref());
    let mut config = match load_config(&source) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };
    if let Some(work_dir) = cli.work_dir {
        config.work_dir = work_dir;
    }
    if let Some(pid_dir) = cli.pid_dir {
        config.pid_dir = pid_dir;
    }
    config.strict |= cli.strict;

    let daemon = match DaemonBinary::locate(&config) {
        Ok(daemon) => daemon,
        Err(e) => {
            // Exits 0 unless strict, matching the init script this replaces
            tracing::warn!("{}", e);
            cli::output::not_found(&config.daemon_name);
            std::process::exit(if config.strict { 1 } else { 0 });
        }
    };

    let supervisor = Supervisor::new(config, daemon);

    let result = match command {
        Commands::Start => cli::service::run_start(&supervisor).await,
        Commands::Stop => cli::service::run_stop(&supervisor).await,
        Commands::Restart => cli::service::run_restart(&supervisor).await,
        Commands::Condrestart => cli::service::run_condrestart(&supervisor).await,
        Commands::Reload => cli::service::run_reload(&supervisor),
        Commands::Reopen => cli::service::run_reopen(&supervisor),
        Commands::Status => cli::service::run_status(&supervisor),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: SupervisorError) -> ! {
    let exit_code = match e {
        // Configuration errors (exit code 2)
        SupervisorError::Config(_) | SupervisorError::Toml(_) => 2,
        // Everything else is a runtime failure (exit code 1)
        SupervisorError::NotRunning
        | SupervisorError::BinaryNotFound { .. }
        | SupervisorError::UnitsFailed { .. }
        | SupervisorError::Process(_)
        | SupervisorError::Hook(_)
        | SupervisorError::Io(_) => 1,
    };

    cli::output::error(&e);
    std::process::exit(exit_code);
}
