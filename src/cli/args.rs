//! Command-line arguments for the `snmp-flow` poller.

use std::time::Duration;

use clap::Parser;

use crate::oid::Oid;
use crate::poll::{PollJob, PollMode, SchedulerConfig, Switch};

/// Poll switch interface counters and report per-port traffic.
#[derive(Debug, Parser)]
#[command(name = "snmp-flow", version, about)]
pub struct PollerArgs {
    /// Maximum number of concurrent polls.
    #[arg(short = 'w', long = "workers", default_value = "100")]
    pub workers: usize,

    /// Milliseconds between job dispatches.
    #[arg(short = 'i', long = "interval", default_value = "10")]
    pub interval: u64,

    /// SNMP timeout per attempt, in milliseconds.
    #[arg(long = "timeout", default_value = "500")]
    pub timeout: u64,

    /// Comma-separated OIDs to poll on every switch.
    #[arg(long = "oids", default_value = "")]
    pub oids: String,

    /// JSON inventory file of {host, community} records.
    #[arg(long = "datafile", default_value = "")]
    pub datafile: String,

    /// Inventory endpoint; preferred over --datafile.
    #[arg(long = "datauri", default_value = "")]
    pub datauri: String,

    /// Single Get per OID instead of a walk; match counters by substring.
    #[arg(long = "debug")]
    pub debug: bool,

    /// Number of leading jobs dispatched without pacing.
    #[arg(long = "pp", default_value = "0")]
    pub priority: usize,

    /// SNMP retries per poll.
    #[arg(long = "rt", default_value = "0")]
    pub retries: u32,

    /// Where reports are posted.
    #[arg(long = "reporturi", default_value = "http://localhost:8080/switch/flow")]
    pub report_uri: String,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Where the switch list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventorySource {
    Uri(String),
    File(String),
}

impl PollerArgs {
    /// Parse the OID list.
    pub fn oid_list(&self) -> Result<Vec<Oid>, String> {
        if self.oids.trim().is_empty() {
            return Err("no oids given, pass them with --oids".to_string());
        }
        self.oids
            .split(',')
            .map(|s| Oid::parse(s.trim()).map_err(|e| e.to_string()))
            .collect()
    }

    /// Inventory source, URI first.
    pub fn inventory_source(&self) -> Result<InventorySource, String> {
        if !self.datauri.is_empty() {
            Ok(InventorySource::Uri(self.datauri.clone()))
        } else if !self.datafile.is_empty() {
            Ok(InventorySource::File(self.datafile.clone()))
        } else {
            Err("no inventory given, pass --datauri or --datafile".to_string())
        }
    }

    pub fn poll_mode(&self) -> PollMode {
        if self.debug {
            PollMode::Get
        } else {
            PollMode::Walk
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            workers: self.workers,
            interval: Duration::from_millis(self.interval),
            priority: self.priority,
        }
    }

    /// One job per (oid, switch), ids `"<oid index>-<switch index>"`.
    pub fn jobs(&self, oids: &[Oid], switches: &[Switch]) -> Vec<PollJob> {
        let timeout = Duration::from_millis(self.timeout);
        oids.iter()
            .enumerate()
            .flat_map(|(i, oid)| {
                switches.iter().enumerate().map(move |(j, switch)| {
                    PollJob::new(
                        format!("{}-{}", i, j),
                        switch.host.clone(),
                        switch.community.clone(),
                        oid.clone(),
                        timeout,
                        self.retries,
                    )
                    .mode(self.poll_mode())
                })
            })
            .collect()
    }

    /// Install the tracing subscriber. `RUST_LOG` wins over `-v`.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let default = match self.verbose {
            0 => "info",
            1 => "snmp_flow=debug",
            _ => "snmp_flow=trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
