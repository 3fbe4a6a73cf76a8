//! ndproxy control tool
//!
//! Loads the module against an in-process packet filter, applies the startup
//! configuration and then runs sysctl-style operations on the node tree:
//! `name=value` writes, bare `name` reads.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-3: Content of Audit Records - Structured logging
//! - AU-12: Audit Record Generation - Log module lifecycle
//! - CM-6: Configuration Settings - File and command-line configuration

use anyhow::{Context, Result};
use clap::Parser;
use ndproxyd::{
    AdminNode, AdminSurface, HookState, InProcessFilter, ModuleEvent, NdproxyConfig, NdproxyModule,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// IPv6 Neighbor Discovery proxy configuration tool
#[derive(Parser, Debug)]
#[command(name = "ndproxyctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short = 'c', long, default_value = ndproxyd::config_file::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print every node
    #[arg(short = 'a', long)]
    all: bool,

    /// Print node descriptions instead of values
    #[arg(short = 'd', long)]
    describe: bool,

    /// Dump the committed configuration as JSON
    #[arg(long)]
    json: bool,

    /// Print metrics in the Prometheus text format
    #[arg(long)]
    metrics: bool,

    /// Operations: `name=value` to write, `name` to read
    #[arg(value_name = "NAME[=VALUE]")]
    ops: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ndproxyctl: exiting with error");
            eprintln!("ndproxyctl: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Level used until the configuration file has been read.
const BOOTSTRAP_LOG_LEVEL: &str = "info";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize structured logging
///
/// Installed before the configuration is read so its messages are kept; the
/// returned handle switches to the configured level afterwards. `RUST_LOG`
/// takes precedence over both. Logs go to stderr so node values on stdout
/// stay machine-readable.
fn init_logging() -> Result<FilterHandle> {
    let (filter, handle) = reload::Layer::new(env_filter(BOOTSTRAP_LOG_LEVEL));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(handle)
}

fn run(cli: &Cli) -> Result<()> {
    let log_filter = init_logging()?;

    let config = NdproxyConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate().context("invalid configuration")?;
    log_filter
        .reload(env_filter(&config.logging.level))
        .context("failed to apply configured log level")?;

    let module = NdproxyModule::new(Arc::new(InProcessFilter::new()))?
        .with_attach_on_load(config.module.attach_on_load);

    // A refused hook leaves the module loaded and the node tree writable.
    let loaded = module.handle_event(ModuleEvent::Load);
    info!(hook = ?module.hook_state(), "module loaded");
    config.apply(module.admin()).context("applying configured lists")?;

    let mut out = io::stdout().lock();
    let outcome = report(cli, &module, &mut out);
    let hook = hook_outcome(loaded, module.hook_state());

    module.handle_event(ModuleEvent::Unload)?;
    outcome.and(hook)
}

/// Fails when Load could not register the hook and nothing attached it since.
fn hook_outcome(loaded: ndproxyd::Result<()>, state: HookState) -> Result<()> {
    match (loaded, state) {
        (Err(e), HookState::Detached) => {
            Err(anyhow::Error::new(e).context("interception hook not registered"))
        }
        (Err(e), HookState::Attached) => {
            warn!(error = %e, "hook refused on load, attached later");
            Ok(())
        }
        (Ok(()), _) => Ok(()),
    }
}

fn report(cli: &Cli, module: &NdproxyModule, out: &mut impl Write) -> Result<()> {
    for op in &cli.ops {
        execute(module.admin(), op, cli.describe, out)?;
    }
    if cli.all {
        for node in AdminNode::ALL {
            print_node(module.admin(), node, cli.describe, out)?;
        }
    }
    if cli.json {
        serde_json::to_writer_pretty(&mut *out, &*module.snapshot())?;
        writeln!(out)?;
    }
    if cli.metrics {
        write!(out, "{}", module.metrics().render()?)?;
    }
    Ok(())
}

/// Run one `name=value` write or bare `name` read.
fn execute(admin: &AdminSurface, op: &str, describe: bool, out: &mut impl Write) -> Result<()> {
    match op.split_once('=') {
        Some((name, value)) => {
            let node: AdminNode = name.trim().parse()?;
            let old = admin.read(node);
            admin
                .write(node, value)
                .with_context(|| format!("{}: write rejected", node.qualified_name()))?;
            writeln!(out, "{}: {} -> {}", node.qualified_name(), old, admin.read(node))?;
        }
        None => print_node(admin, op.trim().parse()?, describe, out)?,
    }
    Ok(())
}

fn print_node(admin: &AdminSurface, node: AdminNode, describe: bool, out: &mut impl Write) -> Result<()> {
    let value = if describe {
        node.description().to_string()
    } else {
        admin.read(node)
    };
    writeln!(out, "{}: {}", node.qualified_name(), value)?;
    Ok(())
}
