//! In-process SNMPv2c agent for testing.
//!
//! Serves Get, GetNext, GetBulk and Set from an in-memory MIB on an ephemeral
//! localhost port. Requests with the wrong community are ignored, like a real
//! agent would. The agent can drop the first N requests to simulate loss or
//! answer them late to simulate a slow device, and shuts down on drop.

use crate::common::fixtures;

use bytes::Bytes;
use snmp_flow::{AsnValue, ErrorStatus, Message, Oid, Pdu, PduKind, VarBind};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct AgentState {
    mib: Mutex<BTreeMap<Oid, AsnValue>>,
    community: Bytes,
    drop_first: AtomicUsize,
    delay_first: AtomicUsize,
    delay_ms: AtomicU64,
    received: AtomicUsize,
}

/// An in-process SNMP agent for testing.
///
/// # Example
///
/// ```ignore
/// let agent = TestAgent::new().await;
/// let session = Session::builder(agent.addr().to_string()).connect().await?;
/// let value = session.get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).await?;
/// ```
pub struct TestAgent {
    addr: SocketAddr,
    state: Arc<AgentState>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl TestAgent {
    /// Agent serving [`fixtures::switch_mib`] to community "public".
    pub async fn new() -> Self {
        Self::with_data(fixtures::switch_mib()).await
    }

    /// Agent that silently drops its first `n` requests.
    pub async fn lossy(n: usize) -> Self {
        let agent = Self::new().await;
        agent.state.drop_first.store(n, Ordering::SeqCst);
        agent
    }

    /// Agent that answers its first `n` requests only after `delay`.
    pub async fn slow(n: usize, delay: Duration) -> Self {
        let agent = Self::new().await;
        agent
            .state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
        agent.state.delay_first.store(n, Ordering::SeqCst);
        agent
    }

    /// Agent with custom MIB data.
    pub async fn with_data(mib: BTreeMap<Oid, AsnValue>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test agent");
        let addr = socket.local_addr().expect("test agent address");

        let state = Arc::new(AgentState {
            mib: Mutex::new(mib),
            community: Bytes::from_static(fixtures::COMMUNITY.as_bytes()),
            drop_first: AtomicUsize::new(0),
            delay_first: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
            received: AtomicUsize::new(0),
        });
        let cancel = CancellationToken::new();

        let task = tokio::spawn(serve(
            Arc::new(socket),
            Arc::clone(&state),
            cancel.clone(),
        ));

        Self {
            addr,
            state,
            cancel,
            _task: task,
        }
    }

    /// The agent's listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of datagrams received, including dropped ones.
    pub fn received(&self) -> usize {
        self.state.received.load(Ordering::SeqCst)
    }

    /// Current value in the MIB.
    pub fn get(&self, oid: &Oid) -> Option<AsnValue> {
        self.state.mib.lock().unwrap().get(oid).cloned()
    }

    /// Stop answering. Called automatically on drop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn serve(socket: Arc<UdpSocket>, state: Arc<AgentState>, cancel: CancellationToken) {
    let mut buf = vec![0u8; 65535];
    loop {
        let (len, peer) = tokio::select! {
            _ = cancel.cancelled() => return,
            result = socket.recv_from(&mut buf) => match result {
                Ok(r) => r,
                Err(_) => return,
            },
        };
        state.received.fetch_add(1, Ordering::SeqCst);

        let dropping = state
            .drop_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if dropping {
            continue;
        }

        let Ok(request) = Message::decode(Bytes::copy_from_slice(&buf[..len])) else {
            continue;
        };
        if request.community != state.community {
            continue;
        }

        let pdu = respond(&state, request.pdu);
        let reply = Message::new(request.version, request.community, pdu)
            .encode()
            .expect("test agent reply encodes");

        let delaying = state
            .delay_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if delaying {
            let delay = Duration::from_millis(state.delay_ms.load(Ordering::SeqCst));
            let socket = Arc::clone(&socket);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = socket.send_to(&reply, peer).await;
            });
            continue;
        }
        let _ = socket.send_to(&reply, peer).await;
    }
}

fn successor(mib: &BTreeMap<Oid, AsnValue>, oid: &Oid) -> Option<VarBind> {
    mib.range((Bound::Excluded(oid.clone()), Bound::Unbounded))
        .next()
        .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
}

fn respond(state: &AgentState, request: Pdu) -> Pdu {
    let mut mib = state.mib.lock().unwrap();
    let id = request.request_id;

    let varbinds = match request.kind {
        PduKind::GetRequest => request
            .varbinds
            .into_iter()
            .map(|vb| {
                let value = mib.get(&vb.oid).cloned().unwrap_or(AsnValue::NoSuchObject);
                VarBind::new(vb.oid, value)
            })
            .collect(),
        PduKind::GetNextRequest => request
            .varbinds
            .into_iter()
            .map(|vb| {
                successor(&mib, &vb.oid)
                    .unwrap_or_else(|| VarBind::new(vb.oid, AsnValue::EndOfMibView))
            })
            .collect(),
        PduKind::GetBulkRequest => {
            let non_repeaters = request.error_status.max(0) as usize;
            let max_repetitions = request.error_index.max(0) as usize;
            let mut out = Vec::new();

            for vb in request.varbinds.iter().take(non_repeaters) {
                out.push(
                    successor(&mib, &vb.oid)
                        .unwrap_or_else(|| VarBind::new(vb.oid.clone(), AsnValue::EndOfMibView)),
                );
            }
            for vb in request.varbinds.iter().skip(non_repeaters) {
                let mut cursor = vb.oid.clone();
                for _ in 0..max_repetitions {
                    match successor(&mib, &cursor) {
                        Some(next) => {
                            cursor = next.oid.clone();
                            out.push(next);
                        }
                        None => {
                            out.push(VarBind::new(cursor.clone(), AsnValue::EndOfMibView));
                            break;
                        }
                    }
                }
            }
            out
        }
        PduKind::SetRequest => {
            for vb in &request.varbinds {
                mib.insert(vb.oid.clone(), vb.value.clone());
            }
            request.varbinds
        }
        PduKind::GetResponse => {
            return Pdu::response(id, ErrorStatus::GenErr, 0, request.varbinds);
        }
    };

    Pdu::response(id, ErrorStatus::NoError, 0, varbinds)
}
