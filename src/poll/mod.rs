//! Interface traffic polling.
//!
//! A [`PollJob`] names one (switch, OID) pair. Running it opens a session,
//! walks the OID subtree (or issues a single Get in [`PollMode::Get`]) and
//! turns every row into a [`Sample`] keyed by the port index in the last OID
//! arc. The [`scheduler`] runs many jobs concurrently and feeds outcomes into
//! a [`report::Report`].

pub mod inventory;
pub mod report;
pub mod scheduler;

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::Result;
use crate::oid::Oid;
use crate::session::Session;
use crate::transport::Transport;
use crate::value::AsnValue;

pub use inventory::Switch;
pub use report::{Property, Report};
pub use scheduler::{Scheduler, SchedulerConfig};

/// ifHCInOctets column.
pub const IN_OCTETS_OID: &str = "1.3.6.1.2.1.31.1.1.1.6";

/// ifHCOutOctets column.
pub const OUT_OCTETS_OID: &str = "1.3.6.1.2.1.31.1.1.1.10";

/// How a job reads its OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollMode {
    /// Walk the subtree with GetBulk.
    #[default]
    Walk,
    /// Single Get on the OID itself. Reports match counters by substring.
    Get,
}

/// Errors from inventory loading and report delivery.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    /// No inventory file was given.
    #[error("inventory file path is empty")]
    EmptyPath,

    /// The inventory file could not be read.
    #[error("inventory file {}: {source}", path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Inventory or report JSON could not be (de)serialized.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An HTTP request failed.
    #[error("HTTP request to {uri} failed: {source}")]
    Http { uri: String, source: reqwest::Error },
}

/// One unit of polling work.
#[derive(Debug, Clone)]
pub struct PollJob {
    pub id: String,
    pub host: String,
    pub community: String,
    pub oid: Oid,
    /// Per-attempt SNMP timeout
    pub timeout: Duration,
    pub retries: u32,
    pub mode: PollMode,
}

/// One counter reading for one port.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub host: String,
    /// Last arc of the returned OID (ifIndex)
    pub port: u32,
    pub flow: u64,
    /// Returned OID with the port arc removed, i.e. the counter column
    pub oid: Oid,
    /// Unix seconds when the job started
    pub start_clock: i64,
    /// Unix seconds when the job finished
    pub clock: i64,
}

/// A job that could not produce samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PollFailure {
    pub host: String,
    pub oid: Oid,
    pub message: String,
}

impl fmt::Display for PollFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oid({}) host({}): {}", self.oid, self.host, self.message)
    }
}

/// Result of running one job.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Samples(Vec<Sample>),
    Failed(PollFailure),
}

impl PollOutcome {
    /// Set the start and end clocks on every sample.
    pub fn stamp(&mut self, start_clock: i64, clock: i64) {
        if let PollOutcome::Samples(samples) = self {
            for sample in samples {
                sample.start_clock = start_clock;
                sample.clock = clock;
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PollOutcome::Failed(_))
    }
}

impl PollJob {
    /// Create a walk-mode job.
    pub fn new(
        id: impl Into<String>,
        host: impl Into<String>,
        community: impl Into<String>,
        oid: Oid,
        timeout: Duration,
        retries: u32,
    ) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            community: community.into(),
            oid,
            timeout,
            retries,
            mode: PollMode::Walk,
        }
    }

    /// Set the poll mode.
    pub fn mode(mut self, mode: PollMode) -> Self {
        self.mode = mode;
        self
    }

    /// Open a UDP session to the job's host and poll it.
    ///
    /// Never fails; errors become [`PollOutcome::Failed`].
    pub async fn run(&self) -> PollOutcome {
        let session = Session::builder(self.host.as_str())
            .community(self.community.clone())
            .timeout(self.timeout)
            .retries(self.retries)
            .connect()
            .await;

        let outcome = match session {
            Ok(session) => {
                let result = self.poll(&session).await;
                session.close();
                result
            }
            Err(e) => Err(e),
        };
        self.outcome(outcome)
    }

    /// Poll over an existing session.
    #[tracing::instrument(level = "debug", skip(self, session), fields(job.id = %self.id, snmp.target = %self.host, snmp.oid = %self.oid))]
    pub async fn poll<T: Transport>(&self, session: &Session<T>) -> Result<Vec<Sample>> {
        let rows = match self.mode {
            PollMode::Walk => session.walk(&self.oid).await?.into_iter().collect(),
            PollMode::Get => {
                let value = session.get(&self.oid).await?;
                vec![(self.oid.to_string(), value)]
            }
        };

        let mut samples = Vec::with_capacity(rows.len());
        for (oid_text, value) in rows {
            let oid = Oid::parse(&oid_text)?;
            match self.sample(&oid, &value) {
                Some(sample) => samples.push(sample),
                None => {
                    tracing::debug!(target: "snmp_flow::poll", { snmp.oid = %oid, value = %value }, "skipping non-counter row")
                }
            }
        }
        Ok(samples)
    }

    /// Wrap a poll result, logging failures.
    pub fn outcome(&self, result: Result<Vec<Sample>>) -> PollOutcome {
        match result {
            Ok(samples) => PollOutcome::Samples(samples),
            Err(e) => {
                tracing::warn!(target: "snmp_flow::poll", { job.id = %self.id, snmp.target = %self.host, snmp.oid = %self.oid, error = %e }, "poll failed");
                PollOutcome::Failed(PollFailure {
                    host: self.host.clone(),
                    oid: self.oid.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    fn sample(&self, oid: &Oid, value: &AsnValue) -> Option<Sample> {
        Some(Sample {
            host: self.host.clone(),
            port: oid.last_arc()?,
            flow: value.as_u64()?,
            oid: oid.parent()?,
            start_clock: 0,
            clock: 0,
        })
    }
}

/// Job counters shared by concurrently running polls.
#[derive(Debug, Default)]
pub struct PollStats {
    jobs: AtomicU64,
    failures: AtomicU64,
}

impl PollStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished job.
    pub fn record(&self, outcome: &PollOutcome) {
        self.jobs.fetch_add(1, Ordering::Relaxed);
        if outcome.is_failure() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn jobs(&self) -> u64 {
        self.jobs.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::session::SessionConfig;
    use crate::transport::{MockTransport, ResponseBuilder};
    use std::sync::Arc;

    fn mock_session(host: &str) -> (MockTransport, Session<MockTransport>) {
        let mock = MockTransport::new(format!("{}:161", host).parse().unwrap());
        let session = Session::new(
            mock.clone(),
            SessionConfig {
                timeout: Duration::from_millis(10),
                retries: 0,
                ..Default::default()
            },
        );
        (mock, session)
    }

    #[tokio::test]
    async fn test_poll_single_port_leaf() {
        let (mut mock, session) = mock_session("10.0.0.1");
        let leaf = oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6, 101);
        mock.queue_response(
            ResponseBuilder::new(1)
                .varbind(leaf.clone(), AsnValue::Counter64(987_654_321))
                .build_v2c(b"public"),
        );

        let job = PollJob::new(
            "0-0",
            "10.0.0.1",
            "public",
            leaf,
            Duration::from_millis(500),
            0,
        )
        .mode(PollMode::Get);
        let samples = job.poll(&session).await.unwrap();

        assert_eq!(samples.len(), 1);
        let sample = &samples[0];
        assert_eq!(sample.host, "10.0.0.1");
        assert_eq!(sample.port, 101);
        assert_eq!(sample.oid, Oid::parse(IN_OCTETS_OID).unwrap());
        assert_eq!(sample.flow, 987_654_321);
        assert_eq!(&mock.requests()[0].message.as_ref().unwrap().community[..], b"public");
    }

    #[tokio::test]
    async fn test_poll_walks_column() {
        let (mut mock, session) = mock_session("10.0.0.2");
        let column = Oid::parse(OUT_OCTETS_OID).unwrap();
        mock.queue_response(
            ResponseBuilder::new(1)
                .varbind(column.child(1), AsnValue::Counter64(10))
                .varbind(column.child(2), AsnValue::Counter64(20))
                .varbind(oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 11, 1), AsnValue::Counter64(1))
                .build_v2c(b"public"),
        );

        let job = PollJob::new("1-0", "10.0.0.2", "public", column.clone(), Duration::from_millis(500), 0);
        let samples = job.poll(&session).await.unwrap();

        let mut ports: Vec<_> = samples.iter().map(|s| (s.port, s.flow)).collect();
        ports.sort();
        assert_eq!(ports, vec![(1, 10), (2, 20)]);
        assert!(samples.iter().all(|s| s.oid == column));
    }

    #[tokio::test]
    async fn test_poll_skips_non_numeric_rows() {
        let (mut mock, session) = mock_session("10.0.0.3");
        let leaf = oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6, 7);
        mock.queue_response(
            ResponseBuilder::new(1)
                .varbind(leaf.clone(), AsnValue::NoSuchInstance)
                .build_v2c(b"public"),
        );

        let job = PollJob::new("0-0", "10.0.0.3", "public", leaf, Duration::from_millis(500), 0)
            .mode(PollMode::Get);
        assert!(job.poll(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_poll_outcome() {
        let (_mock, session) = mock_session("10.0.0.4");
        let job = PollJob::new(
            "0-0",
            "10.0.0.4",
            "public",
            Oid::parse(IN_OCTETS_OID).unwrap(),
            Duration::from_millis(10),
            0,
        );

        let outcome = job.outcome(job.poll(&session).await);
        match outcome {
            PollOutcome::Failed(failure) => {
                assert_eq!(failure.host, "10.0.0.4");
                assert!(failure.message.contains("timeout"), "{}", failure.message);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_stamp_sets_clocks() {
        let mut outcome = PollOutcome::Samples(vec![Sample {
            host: "h".into(),
            port: 1,
            flow: 2,
            oid: oid!(1, 3),
            start_clock: 0,
            clock: 0,
        }]);
        outcome.stamp(100, 105);
        let PollOutcome::Samples(samples) = outcome else {
            unreachable!()
        };
        assert_eq!((samples[0].start_clock, samples[0].clock), (100, 105));
    }

    #[tokio::test]
    async fn test_stats_concurrent_record() {
        let stats = Arc::new(PollStats::new());
        let failure = PollOutcome::Failed(PollFailure {
            host: "h".into(),
            oid: oid!(1, 3),
            message: "x".into(),
        });

        let mut handles = Vec::new();
        for i in 0..32 {
            let stats = Arc::clone(&stats);
            let outcome = if i % 4 == 0 {
                failure.clone()
            } else {
                PollOutcome::Samples(Vec::new())
            };
            handles.push(tokio::spawn(async move { stats.record(&outcome) }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(stats.jobs(), 32);
        assert_eq!(stats.failures(), 8);
    }
}
