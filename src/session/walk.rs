//! Subtree enumeration over GetBulk.

use tracing::instrument;

use super::{Session, ValueMap};
use crate::error::{Error, ProtocolErrorKind, Result};
use crate::oid::Oid;
use crate::transport::Transport;

impl<T: Transport> Session<T> {
    /// Collect every object under `root`, keyed by OID text.
    ///
    /// Issues GetBulk requests of `max_repetitions` rows starting at `root`.
    /// After each batch the cursor moves to the last OID returned, even when
    /// that OID is already outside the subtree; the whole batch is still
    /// scanned, and the loop ends once the cursor leaves `root`. A batch that
    /// does not move the cursor also ends the walk.
    ///
    /// Exception values (`endOfMibView` and friends) are not recorded. An
    /// empty batch is an error.
    ///
    /// ```rust,no_run
    /// # async fn example(session: snmp_flow::Session) -> snmp_flow::Result<()> {
    /// let table = session.walk(&snmp_flow::oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10)).await?;
    /// for (oid, value) in &table {
    ///     println!("{} = {}", oid, value);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(level = "debug", skip(self), fields(snmp.target = %self.peer_addr(), snmp.oid = %root))]
    pub async fn walk(&self, root: &Oid) -> Result<ValueMap> {
        let batch_size = self.config.max_repetitions;
        let mut results = ValueMap::new();
        let mut cursor = root.clone();
        let mut batches = 0usize;

        while cursor.within(root) {
            let batch = self.get_bulk_array(&cursor, batch_size).await?;
            batches += 1;

            let Some(last) = batch.last().map(|vb| vb.oid.clone()) else {
                return Err(Error::Protocol {
                    target: Some(self.peer_addr()),
                    kind: ProtocolErrorKind::EmptyResponse,
                });
            };

            for vb in batch {
                if vb.oid.within(root) && !vb.value.is_exception() {
                    results.insert(vb.oid.to_string(), vb.value);
                }
            }

            if last == cursor {
                tracing::debug!(target: "snmp_flow::walk", { snmp.oid = %cursor }, "agent returned no new objects, stopping walk");
                break;
            }
            cursor = last;
        }

        tracing::debug!(target: "snmp_flow::walk", { batches, rows = results.len() }, "walk complete");
        Ok(results)
    }
}
