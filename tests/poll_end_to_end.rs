//! Poll jobs, scheduler and report against the in-process agent.

mod common;

use common::*;
use snmp_flow::poll::{
    IN_OCTETS_OID, PollJob, PollMode, PollOutcome, Report, Scheduler, SchedulerConfig,
};
use snmp_flow::{AsnValue, Oid, oid};
use std::collections::BTreeMap;
use std::time::Duration;

fn job(agent: &TestAgent, id: &str, oid: Oid) -> PollJob {
    PollJob::new(
        id,
        agent.addr().to_string(),
        COMMUNITY,
        oid,
        Duration::from_millis(500),
        1,
    )
}

#[tokio::test]
async fn single_port_leaf() {
    let mut mib = BTreeMap::new();
    mib.insert(
        oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6, 101),
        AsnValue::Counter64(42_000_000),
    );
    let agent = TestAgent::with_data(mib).await;

    let outcome = job(&agent, "0-0", oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6, 101))
        .mode(PollMode::Get)
        .run()
        .await;

    let PollOutcome::Samples(samples) = outcome else {
        panic!("poll failed: {:?}", outcome);
    };
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].host, agent.addr().to_string());
    assert_eq!(samples[0].port, 101);
    assert_eq!(samples[0].oid, Oid::parse(IN_OCTETS_OID).unwrap());
    assert_eq!(samples[0].flow, 42_000_000);
}

#[tokio::test]
async fn walk_job_yields_every_port() {
    let agent = TestAgent::new().await;

    let outcome = job(&agent, "0-0", if_hc_in_octets()).run().await;
    let PollOutcome::Samples(samples) = outcome else {
        panic!("poll failed: {:?}", outcome);
    };
    assert_eq!(samples.len(), PORT_COUNT as usize);
    let port_7 = samples.iter().find(|s| s.port == 7).unwrap();
    assert_eq!(port_7.flow, 7000);
}

#[tokio::test]
async fn unreachable_host_is_a_failure() {
    let agent = TestAgent::lossy(usize::MAX).await;
    let mut job = job(&agent, "0-0", if_hc_in_octets());
    job.timeout = Duration::from_millis(30);
    job.retries = 0;

    match job.run().await {
        PollOutcome::Failed(failure) => {
            assert_eq!(failure.oid, if_hc_in_octets());
            assert!(!failure.message.is_empty());
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn scheduler_merges_in_and_out() {
    let agent = TestAgent::new().await;
    let other = TestAgent::lossy(usize::MAX).await;

    let mut jobs = vec![
        job(&agent, "0-0", if_hc_in_octets()),
        job(&agent, "1-0", if_hc_out_octets()),
    ];
    let mut dead = job(&other, "0-1", if_hc_in_octets());
    dead.timeout = Duration::from_millis(30);
    dead.retries = 0;
    jobs.push(dead);

    let scheduler = Scheduler::new(SchedulerConfig {
        workers: 2,
        interval: Duration::from_millis(1),
        priority: 0,
    });
    let mut report = Report::new("", PollMode::Walk);
    scheduler.run(jobs, &mut report).await;

    let stats = scheduler.stats();
    assert_eq!(stats.jobs(), 3);
    assert_eq!(stats.failures(), 1);

    assert_eq!(report.host_count(), 1);
    assert_eq!(report.row_count(), 2 * PORT_COUNT as usize);

    let rows = report.properties(&agent.addr().to_string());
    assert_eq!(rows.len(), PORT_COUNT as usize);
    let port_3 = rows.iter().find(|p| p.port == 3).unwrap();
    assert_eq!(port_3.in_bound, 3000);
    assert_eq!(port_3.out_bound, 6000);
    assert!(port_3.start_clock > 0);
}
