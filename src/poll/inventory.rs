//! Switch inventory loading.
//!
//! The inventory is a list of `{host, community}` records, read either from a
//! local JSON file or from an HTTP endpoint that wraps the list in
//! `{message, code, success, object}`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::PollerError;

/// Extra attempts after a failed inventory request.
pub const FETCH_RETRIES: u32 = 3;

/// Fixed pause between inventory request attempts.
pub const FETCH_BACKOFF: Duration = Duration::from_secs(1);

/// A polled switch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Switch {
    pub host: String,
    pub community: String,
}

/// Envelope returned by the inventory endpoint.
#[derive(Debug, Deserialize)]
struct InventoryResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: i64,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    object: Vec<Switch>,
}

/// Load switches from a JSON array file.
///
/// Single quotes are accepted in place of double quotes.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<Switch>, PollerError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(PollerError::EmptyPath);
    }

    let text = std::fs::read_to_string(path).map_err(|source| PollerError::File {
        path: path.to_path_buf(),
        source,
    })?;
    parse_switch_list(&text)
}

/// Parse a JSON switch array, accepting single-quoted strings.
pub fn parse_switch_list(text: &str) -> Result<Vec<Switch>, PollerError> {
    Ok(serde_json::from_str(&text.replace('\'', "\""))?)
}

/// Fetch switches from the inventory endpoint.
///
/// Request failures are retried [`FETCH_RETRIES`] times with a fixed
/// [`FETCH_BACKOFF`] pause.
pub async fn load_from_uri(client: &reqwest::Client, uri: &str) -> Result<Vec<Switch>, PollerError> {
    load_from_uri_with(client, uri, FETCH_RETRIES, FETCH_BACKOFF).await
}

pub(crate) async fn load_from_uri_with(
    client: &reqwest::Client,
    uri: &str,
    retries: u32,
    backoff: Duration,
) -> Result<Vec<Switch>, PollerError> {
    let http_err = |source| PollerError::Http {
        uri: uri.to_string(),
        source,
    };

    let mut attempt = 0;
    let response = loop {
        match client.get(uri).send().await {
            Ok(response) => break response,
            Err(e) if attempt < retries => {
                attempt += 1;
                tracing::warn!(target: "snmp_flow::poll", { uri, attempt, error = %e }, "inventory request failed, reconnecting");
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(http_err(e)),
        }
    };

    let body = response.text().await.map_err(http_err)?;
    let envelope: InventoryResponse = serde_json::from_str(&body)?;
    tracing::debug!(
        target: "snmp_flow::poll",
        { uri, code = envelope.code, success = envelope.success, message = %envelope.message, switches = envelope.object.len() },
        "loaded inventory"
    );
    Ok(envelope.object)
}
