//! Get, GetNext, GetBulk and Set operations.

use std::collections::BTreeMap;

use tracing::instrument;

use super::Session;
use crate::error::{Error, ProtocolErrorKind, Result};
use crate::message::Pdu;
use crate::oid::Oid;
use crate::transport::Transport;
use crate::value::AsnValue;
use crate::varbind::VarBind;

/// Results keyed by the dotted text of each returned OID.
pub type ValueMap = BTreeMap<String, AsnValue>;

fn into_map(varbinds: Vec<VarBind>) -> ValueMap {
    varbinds
        .into_iter()
        .map(|vb| (vb.oid.to_string(), vb.value))
        .collect()
}

impl<T: Transport> Session<T> {
    fn first_varbind(&self, pdu: Pdu) -> Result<VarBind> {
        pdu.varbinds.into_iter().next().ok_or_else(|| Error::Protocol {
            target: Some(self.peer_addr()),
            kind: ProtocolErrorKind::EmptyResponse,
        })
    }

    /// Fetch a single value.
    #[instrument(level = "debug", skip(self), fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn get(&self, oid: &Oid) -> Result<AsnValue> {
        let pdu = Pdu::get_request(self.next_request_id(), std::slice::from_ref(oid));
        let response = self.exchange(pdu).await?;
        Ok(self.first_varbind(response)?.value)
    }

    /// Fetch several values in one request.
    #[instrument(level = "debug", skip(self, oids), fields(snmp.target = %self.peer_addr(), snmp.oid_count = oids.len()))]
    pub async fn get_multiple(&self, oids: &[Oid]) -> Result<ValueMap> {
        let pdu = Pdu::get_request(self.next_request_id(), oids);
        let response = self.exchange(pdu).await?;
        Ok(into_map(response.varbinds))
    }

    /// Write a single value, returning the value echoed by the agent.
    #[instrument(level = "debug", skip(self, value), fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn set(&self, oid: &Oid, value: AsnValue) -> Result<AsnValue> {
        let pdu = Pdu::set_request(
            self.next_request_id(),
            vec![VarBind::new(oid.clone(), value)],
        );
        let response = self.exchange(pdu).await?;
        Ok(self.first_varbind(response)?.value)
    }

    /// Write several values in one SetRequest.
    #[instrument(level = "debug", skip(self, values), fields(snmp.target = %self.peer_addr()))]
    pub async fn set_multiple(
        &self,
        values: impl IntoIterator<Item = (Oid, AsnValue)>,
    ) -> Result<ValueMap> {
        let varbinds = values
            .into_iter()
            .map(|(oid, value)| VarBind::new(oid, value))
            .collect();
        let pdu = Pdu::set_request(self.next_request_id(), varbinds);
        let response = self.exchange(pdu).await?;
        Ok(into_map(response.varbinds))
    }

    /// Fetch the lexicographic successor of `oid`.
    #[instrument(level = "debug", skip(self), fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn get_next(&self, oid: &Oid) -> Result<(Oid, AsnValue)> {
        let pdu = Pdu::get_next_request(self.next_request_id(), std::slice::from_ref(oid));
        let response = self.exchange(pdu).await?;
        let vb = self.first_varbind(response)?;
        Ok((vb.oid, vb.value))
    }

    /// GetBulk with non-repeaters 0, keyed by OID text.
    pub async fn get_bulk(&self, oid: &Oid, max_repetitions: i32) -> Result<ValueMap> {
        Ok(into_map(self.get_bulk_array(oid, max_repetitions).await?))
    }

    /// GetBulk with non-repeaters 0, in response order.
    #[instrument(level = "debug", skip(self), fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn get_bulk_array(&self, oid: &Oid, max_repetitions: i32) -> Result<Vec<VarBind>> {
        let pdu = Pdu::get_bulk(
            self.next_request_id(),
            0,
            max_repetitions,
            std::slice::from_ref(oid),
        );
        Ok(self.exchange(pdu).await?.varbinds)
    }
}
