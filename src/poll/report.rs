//! Per-host traffic report.
//!
//! Samples are grouped by host, then merged per port into one [`Property`]
//! row carrying both the inbound and outbound counter. Each host's rows are
//! posted as a single form field `data=<json array>`.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{IN_OCTETS_OID, OUT_OCTETS_OID, PollMode, PollOutcome, PollerError, Sample};
use crate::oid::Oid;

/// One reported row: both counters of one port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Property {
    pub oid: String,
    pub in_bound: u64,
    pub out_bound: u64,
    pub port: u32,
    pub host: String,
    pub start_clock: i64,
    pub clock: i64,
}

/// Which counter a sample feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

/// Collected samples awaiting delivery.
#[derive(Debug)]
pub struct Report {
    uri: String,
    mode: PollMode,
    in_oid: Oid,
    out_oid: Oid,
    data: BTreeMap<String, Vec<Sample>>,
}

impl Report {
    /// Create an empty report for `uri`.
    pub fn new(uri: impl Into<String>, mode: PollMode) -> Self {
        Self {
            uri: uri.into(),
            mode,
            in_oid: Oid::parse(IN_OCTETS_OID).unwrap_or_default(),
            out_oid: Oid::parse(OUT_OCTETS_OID).unwrap_or_default(),
            data: BTreeMap::new(),
        }
    }

    pub fn add_sample(&mut self, sample: Sample) {
        self.data.entry(sample.host.clone()).or_default().push(sample);
    }

    /// Add the samples of a finished job. Failures carry nothing to report.
    pub fn add_outcome(&mut self, outcome: PollOutcome) {
        if let PollOutcome::Samples(samples) = outcome {
            for sample in samples {
                self.add_sample(sample);
            }
        }
    }

    /// Number of hosts with at least one sample.
    pub fn host_count(&self) -> usize {
        self.data.len()
    }

    /// Number of raw samples collected.
    pub fn row_count(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }

    fn direction(&self, oid: &Oid) -> Option<Direction> {
        match self.mode {
            PollMode::Walk => {
                if *oid == self.in_oid {
                    Some(Direction::In)
                } else if *oid == self.out_oid {
                    Some(Direction::Out)
                } else {
                    None
                }
            }
            PollMode::Get => {
                let text = oid.to_string();
                if text.contains(IN_OCTETS_OID) {
                    Some(Direction::In)
                } else if text.contains(OUT_OCTETS_OID) {
                    Some(Direction::Out)
                } else {
                    None
                }
            }
        }
    }

    /// Merge one host's samples into per-port rows, ordered by port.
    pub fn properties(&self, host: &str) -> Vec<Property> {
        let mut ports: BTreeMap<u32, Property> = BTreeMap::new();
        for sample in self.data.get(host).into_iter().flatten() {
            let property = ports.entry(sample.port).or_default();
            property.port = sample.port;
            property.host = sample.host.clone();
            property.oid = oid_text(&sample.oid);
            property.start_clock = sample.start_clock;
            property.clock = sample.clock;
            match self.direction(&sample.oid) {
                Some(Direction::In) => property.in_bound = sample.flow,
                Some(Direction::Out) => property.out_bound = sample.flow,
                None => {}
            }
        }
        ports.into_values().collect()
    }

    /// Post every host's rows. Returns the number of rows the sink accepted.
    ///
    /// Nothing is posted when the URI is 5 characters or shorter. A failed
    /// post is logged and does not stop the remaining hosts.
    pub async fn send(&self, client: &reqwest::Client) -> Result<usize, PollerError> {
        if self.uri.len() <= 5 {
            tracing::debug!(target: "snmp_flow::poll", { uri = %self.uri, hosts = self.data.len() }, "no report uri, skipping delivery");
            return Ok(0);
        }

        let mut sent = 0;
        for host in self.data.keys() {
            let properties = self.properties(host);
            let json = serde_json::to_string(&properties)?;

            match client.post(&self.uri).form(&[("data", json)]).send().await {
                Ok(response) if response.status().is_success() => {
                    sent += properties.len();
                    tracing::debug!(target: "snmp_flow::poll", { host = %host, rows = properties.len() }, "report sent");
                }
                Ok(response) => {
                    tracing::warn!(target: "snmp_flow::poll", { host = %host, status = %response.status() }, "report rejected");
                }
                Err(e) => {
                    tracing::warn!(target: "snmp_flow::poll", { host = %host, error = %e }, "report post failed");
                }
            }
        }
        Ok(sent)
    }
}

/// Dotted OID text without the leading dot, as the report sink expects.
fn oid_text(oid: &Oid) -> String {
    oid.arcs()
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
