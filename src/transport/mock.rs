//! Mock transport for testing.
//!
//! Provides a programmable transport that can simulate various scenarios
//! without needing an actual network connection.

use super::Transport;
use crate::error::{Error, ErrorStatus, Result};
use crate::message::{Message, Pdu};
use crate::oid::Oid;
use crate::value::AsnValue;
use crate::varbind::VarBind;
use bytes::Bytes;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A mock response to return for a request.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this data as the response (request_id will be patched to match)
    Data(Bytes),
    /// Return this data as-is without patching request_id
    RawData(Bytes),
    /// Simulate a timeout
    Timeout,
    /// Simulate an IO error
    IoError(String),
}

/// A recorded request sent through the mock transport.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    /// The raw request data
    pub data: Bytes,
    /// The decoded message, if the request decoded cleanly
    pub message: Option<Message>,
}

impl RecordedRequest {
    /// Request ID of the recorded message.
    pub fn request_id(&self) -> Option<i32> {
        self.message.as_ref().map(|m| m.pdu.request_id)
    }

    /// First varbind OID of the recorded message.
    pub fn first_oid(&self) -> Option<&Oid> {
        self.message
            .as_ref()
            .and_then(|m| m.pdu.varbinds.first())
            .map(|vb| &vb.oid)
    }
}

struct MockTransportInner {
    target: SocketAddr,
    responses: VecDeque<MockResponse>,
    requests: Vec<RecordedRequest>,
    default_response: Option<MockResponse>,
    last_request_id: Option<i32>,
}

/// Mock transport for testing sessions.
///
/// Clones share state, so a test can keep one handle to inspect recorded
/// requests while the session owns another.
///
/// ```rust,ignore
/// use snmp_flow::transport::{MockTransport, ResponseBuilder};
/// use snmp_flow::{AsnValue, oid};
///
/// let mut mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
/// mock.queue_timeout();
/// mock.queue_response(
///     ResponseBuilder::new(1)
///         .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), AsnValue::from("sw-01"))
///         .build_v2c(b"public"),
/// );
/// assert_eq!(mock.queued_response_count(), 2);
/// ```
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new(target: SocketAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                target,
                responses: VecDeque::new(),
                requests: Vec::new(),
                default_response: None,
                last_request_id: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a data response.
    ///
    /// The request_id in the response will be patched to match the actual
    /// request. Use [`queue_raw_response`](Self::queue_raw_response) to
    /// bypass patching.
    pub fn queue_response(&mut self, data: impl Into<Bytes>) {
        self.lock().responses.push_back(MockResponse::Data(data.into()));
    }

    /// Queue a raw data response without request_id patching.
    pub fn queue_raw_response(&mut self, data: impl Into<Bytes>) {
        self.lock()
            .responses
            .push_back(MockResponse::RawData(data.into()));
    }

    /// Queue a timeout.
    pub fn queue_timeout(&mut self) {
        self.lock().responses.push_back(MockResponse::Timeout);
    }

    /// Queue an IO error.
    pub fn queue_io_error(&mut self, msg: impl Into<String>) {
        self.lock()
            .responses
            .push_back(MockResponse::IoError(msg.into()));
    }

    /// Set a default response when the queue is empty.
    pub fn set_default_response(&mut self, response: MockResponse) {
        self.lock().default_response = Some(response);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests sent so far.
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Get the number of queued responses remaining.
    pub fn queued_response_count(&self) -> usize {
        self.lock().responses.len()
    }

    fn patch_request_id(data: Bytes, new_id: i32) -> Bytes {
        let Ok(mut msg) = Message::decode(data.clone()) else {
            return data;
        };
        msg.pdu.request_id = new_id;
        msg.encode().unwrap_or(data)
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8], _timeout: Duration) -> Result<()> {
        let data = Bytes::copy_from_slice(data);
        let message = Message::decode(data.clone()).ok();

        let mut inner = self.lock();
        inner.last_request_id = message.as_ref().map(|m| m.pdu.request_id);
        inner.requests.push(RecordedRequest { data, message });
        Ok(())
    }

    async fn recv(&self, timeout: Duration) -> Result<Bytes> {
        let (response, target, last_request_id) = {
            let mut inner = self.lock();
            let response = inner
                .responses
                .pop_front()
                .or_else(|| inner.default_response.clone());
            (response, inner.target, inner.last_request_id)
        };

        match response {
            Some(MockResponse::Data(data)) => Ok(match last_request_id {
                Some(id) => Self::patch_request_id(data, id),
                None => data,
            }),
            Some(MockResponse::RawData(data)) => Ok(data),
            Some(MockResponse::IoError(msg)) => Err(Error::Io {
                target: Some(target),
                source: std::io::Error::other(msg),
            }),
            Some(MockResponse::Timeout) | None => Err(Error::Timeout {
                target: Some(target),
                elapsed: timeout,
                retries: 0,
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.lock().target
    }
}

/// Builder for SNMP response datagrams in tests.
pub struct ResponseBuilder {
    request_id: i32,
    varbinds: Vec<VarBind>,
    error_status: ErrorStatus,
    error_index: i32,
}

impl ResponseBuilder {
    /// Create a new response builder with the given request ID.
    pub fn new(request_id: i32) -> Self {
        Self {
            request_id,
            varbinds: Vec::new(),
            error_status: ErrorStatus::NoError,
            error_index: 0,
        }
    }

    /// Add a varbind to the response.
    pub fn varbind(mut self, oid: Oid, value: AsnValue) -> Self {
        self.varbinds.push(VarBind::new(oid, value));
        self
    }

    /// Set the error status.
    pub fn error_status(mut self, status: ErrorStatus) -> Self {
        self.error_status = status;
        self
    }

    /// Set the error index.
    pub fn error_index(mut self, index: i32) -> Self {
        self.error_index = index;
        self
    }

    /// Build a v2c SNMP response message.
    ///
    /// Panics if a varbind OID has fewer than two arcs.
    pub fn build_v2c(self, community: &[u8]) -> Bytes {
        let pdu = Pdu::response(
            self.request_id,
            self.error_status,
            self.error_index,
            self.varbinds,
        );
        Message::v2c(Bytes::copy_from_slice(community), pdu)
            .encode()
            .expect("response OIDs must have at least two arcs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn target() -> SocketAddr {
        "127.0.0.1:161".parse().unwrap()
    }

    #[tokio::test]
    async fn test_queue_response_patches_request_id() {
        let mut mock = MockTransport::new(target());
        mock.queue_response(
            ResponseBuilder::new(1)
                .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), AsnValue::from("test"))
                .build_v2c(b"public"),
        );

        let request = Message::v2c(b"public".as_slice(), Pdu::get_request(777, &[oid!(1, 3, 6, 1)]))
            .encode()
            .unwrap();
        mock.send(&request, Duration::from_secs(1)).await.unwrap();

        let data = mock.recv(Duration::from_secs(1)).await.unwrap();
        let reply = Message::decode(data).unwrap();
        assert_eq!(reply.pdu.request_id, 777);
        assert_eq!(mock.requests()[0].request_id(), Some(777));
    }

    #[tokio::test]
    async fn test_raw_response_not_patched() {
        let mut mock = MockTransport::new(target());
        let raw = ResponseBuilder::new(5).build_v2c(b"public");
        mock.queue_raw_response(raw.clone());

        let request = Message::v2c(b"public".as_slice(), Pdu::get_request(9, &[oid!(1, 3)]))
            .encode()
            .unwrap();
        mock.send(&request, Duration::from_secs(1)).await.unwrap();
        assert_eq!(mock.recv(Duration::from_secs(1)).await.unwrap(), raw);
    }

    #[tokio::test]
    async fn test_timeout_and_io_error() {
        let mut mock = MockTransport::new(target());
        mock.queue_timeout();
        mock.queue_io_error("connection refused");

        assert!(matches!(
            mock.recv(Duration::from_millis(100)).await,
            Err(Error::Timeout { .. })
        ));
        assert!(matches!(
            mock.recv(Duration::from_millis(100)).await,
            Err(Error::Io { .. })
        ));
        // Empty queue behaves like a timeout
        assert!(matches!(
            mock.recv(Duration::from_millis(100)).await,
            Err(Error::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_records_requests() {
        let mock = MockTransport::new(target());
        mock.send(b"request 1", Duration::from_secs(1)).await.unwrap();
        mock.send(b"request 2", Duration::from_secs(1)).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].data.as_ref(), b"request 1");
        assert!(requests[1].message.is_none());
    }

    #[tokio::test]
    async fn test_default_response() {
        let mut mock = MockTransport::new(target());
        let response = ResponseBuilder::new(1).build_v2c(b"public");
        mock.set_default_response(MockResponse::RawData(response.clone()));

        assert_eq!(mock.recv(Duration::from_secs(1)).await.unwrap(), response);
        assert_eq!(mock.recv(Duration::from_secs(1)).await.unwrap(), response);
    }
}
