//! Terminal front-end for LAN discovery and inventory scans
//!
//! # Examples
//!
//! ```bash
//! # help menu
//! lanscape --help
//!
//! # scan the local subnet
//! lanscape --targets 192.168.1.0/24
//! ```
use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use lanscape_core::config::{LookupType, ScanConfig};
use lanscape_core::device::Device;
use lanscape_core::scan_manager::ScanManager;
use lanscape_core::scanner::ScanResults;
use log::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// CLI for LAN discovery and inventory scanning
struct Args {
    /// Comma separated list of IPs, IP ranges, and CIDR blocks to scan
    #[arg(short, long, use_value_delimiter = true)]
    targets: Vec<String>,

    /// Named port catalog entry, or an inline range list like "22,80,8000-8010"
    #[arg(short, long, default_value = "default")]
    ports: String,

    /// Skip port scanning entirely, reporting liveness and metadata only
    #[arg(long, default_value_t = false)]
    no_ports: bool,

    /// Skip service fingerprinting, even if port scanning runs
    #[arg(long, default_value_t = false)]
    no_services: bool,

    /// Liveness lookup strategy to try, in order; repeat the flag to chain
    /// strategies (e.g. --lookup icmp --lookup arp)
    #[arg(long = "lookup", value_enum)]
    lookup: Vec<CliLookupType>,

    /// Multiplier applied to every thread-pool sizing knob
    #[arg(long, default_value_t = 1.0)]
    multiplier: f64,

    /// Output the full scan results as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Only print the final report, nothing else
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Print debug logs including those from lanscape-core
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[doc(hidden)]
enum CliLookupType {
    Icmp,
    Arp,
    Poke,
    PokeThenArp,
    IcmpThenArp,
}

impl From<CliLookupType> for LookupType {
    fn from(value: CliLookupType) -> Self {
        match value {
            CliLookupType::Icmp => LookupType::Icmp,
            CliLookupType::Arp => LookupType::Arp,
            CliLookupType::Poke => LookupType::Poke,
            CliLookupType::PokeThenArp => LookupType::PokeThenArp,
            CliLookupType::IcmpThenArp => LookupType::IcmpThenArp,
        }
    }
}

#[doc(hidden)]
fn initialize_logger(args: &Args) -> Result<()> {
    let filter = if args.quiet {
        simplelog::LevelFilter::Error
    } else if args.debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    simplelog::TermLogger::init(
        filter,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[doc(hidden)]
fn print_args(args: &Args, subnet: &str) {
    info!("configuration:");
    info!("targets:      {}", subnet);
    info!("ports:        {}", args.ports);
    info!("no_ports:     {}", args.no_ports);
    info!("no_services:  {}", args.no_services);
    info!("lookup:       {:?}", args.lookup);
    info!("multiplier:   {}", args.multiplier);
    info!("json:         {}", args.json);
    info!("quiet:        {}", args.quiet);
}

#[doc(hidden)]
fn build_config(args: &Args) -> Result<ScanConfig> {
    if args.targets.is_empty() {
        return Err(eyre!("--targets is required, e.g. --targets 192.168.1.0/24"));
    }

    let mut config = ScanConfig::new(args.targets.join(","), args.ports.clone());
    config.t_multiplier = args.multiplier;
    config.task_scan_ports = !args.no_ports;
    config.task_scan_port_services = !args.no_ports && !args.no_services;

    if !args.lookup.is_empty() {
        config.lookup_type = args.lookup.iter().map(|l| (*l).into()).collect();
    }

    Ok(config)
}

#[doc(hidden)]
fn print_results(args: &Args, results: &ScanResults) -> Result<()> {
    if args.json {
        let j = serde_json::to_string(&results)?;
        println!("{j}");
        return Ok(());
    }

    let mut table = prettytable::Table::new();
    table.add_row(prettytable::row!["IP", "HOSTNAME", "MAC", "VENDOR", "OPEN_PORTS"]);

    for device in &results.devices {
        table.add_row(prettytable::row![
            device.ip,
            device.hostname.clone().unwrap_or_default(),
            device.macs.first().cloned().unwrap_or_default(),
            device.manufacturer.clone().unwrap_or_default(),
            open_ports_display(device),
        ]);
    }

    table.printstd();

    if !results.errors.is_empty() {
        warn!("scan finished with {} error(s)", results.errors.len());
    }
    for warning in &results.warnings {
        warn!("{warning}");
    }

    Ok(())
}

#[doc(hidden)]
fn open_ports_display(device: &Device) -> String {
    device
        .ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

#[doc(hidden)]
fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    initialize_logger(&args)?;

    let config = build_config(&args)?;
    print_args(&args, &config.subnet);

    let manager = ScanManager::new();
    let scanner = manager
        .new_scan(config)
        .map_err(|e| eyre!("failed to start scan: {e}"))?;

    info!("scanning...");

    let scanner = manager
        .wait_until_complete(scanner.uid())
        .map_err(|e| eyre!("scan failed: {e}"))?
        .ok_or_else(|| eyre!("scan disappeared from the registry while running"))?;

    let results = scanner.results();
    print_results(&args, &results)?;

    Ok(())
}

#[cfg(test)]
#[path = "./main_tests.rs"]
mod tests;
