//! Client for the peer scraping service.
//!
//! The peer is a separate process that answers lookups the bot does not
//! drive itself. The protocol is one POST per command with a JSON body of
//! `{"comando": <kind>, "args": <args>}` and a JSON response of
//! `{"resultado": ...}` where the result is either plain text or a
//! `{texto, foto_url?}` object. Connection refusal, timeout and malformed
//! bodies are distinguished so each gets its own user-facing message.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::commands::CommandKind;
use crate::config::GatewaySettings;
use crate::error::GatewayError;

/// Result body of a peer call: plain text, or text with an optional image
/// reference attached.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PeerResult {
    Rich {
        texto: String,
        #[serde(default)]
        foto_url: Option<String>,
    },
    Text(String),
}

#[derive(Debug, Deserialize)]
struct PeerEnvelope {
    resultado: PeerResult,
}

pub struct GatewayClient {
    url: String,
    http: reqwest::Client,
    standard_timeout: Duration,
    extended_timeout: Duration,
}

impl GatewayClient {
    pub fn new(settings: &GatewaySettings) -> Self {
        Self {
            url: settings.url.clone(),
            http: reqwest::Client::new(),
            standard_timeout: Duration::from_secs(settings.timeout_secs),
            extended_timeout: Duration::from_secs(settings.extended_timeout_secs),
        }
    }

    /// The registry lookup fans out into extra portal queries on the peer
    /// side, so it gets the extended bound.
    fn timeout_for(&self, kind: CommandKind) -> Duration {
        match kind {
            CommandKind::Ruc => self.extended_timeout,
            _ => self.standard_timeout,
        }
    }

    /// Forward a command to the peer service and return its result body.
    pub async fn call(&self, kind: CommandKind, args: &str) -> Result<PeerResult, GatewayError> {
        debug!(kind = kind.as_str(), "forwarding command to peer service");
        let response = self
            .http
            .post(&self.url)
            .timeout(self.timeout_for(kind))
            .json(&json!({ "comando": kind.as_str(), "args": args }))
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            return Err(GatewayError::Malformed(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let envelope: PeerEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Ok(envelope.resultado)
    }

    /// Fetch an image the peer referenced. Callers fall back to text-only
    /// replies when this fails.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, GatewayError> {
        let response = self
            .http
            .get(url)
            .timeout(self.standard_timeout)
            .send()
            .await
            .map_err(classify_transport_error)?;
        if !response.status().is_success() {
            return Err(GatewayError::Malformed(format!(
                "image fetch returned {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn classify_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else if error.is_connect() {
        GatewayError::Unavailable
    } else {
        GatewayError::Malformed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_result_deserializes_both_shapes() {
        let plain: PeerEnvelope = serde_json::from_str(r#"{"resultado": "hola"}"#).unwrap();
        assert_eq!(plain.resultado, PeerResult::Text("hola".into()));

        let rich: PeerEnvelope = serde_json::from_str(
            r#"{"resultado": {"texto": "datos", "foto_url": "http://x/p.jpg"}}"#,
        )
        .unwrap();
        assert_eq!(
            rich.resultado,
            PeerResult::Rich {
                texto: "datos".into(),
                foto_url: Some("http://x/p.jpg".into())
            }
        );

        let rich_no_photo: PeerEnvelope =
            serde_json::from_str(r#"{"resultado": {"texto": "datos"}}"#).unwrap();
        assert_eq!(
            rich_no_photo.resultado,
            PeerResult::Rich { texto: "datos".into(), foto_url: None }
        );
    }

    #[test]
    fn registry_kind_gets_the_extended_timeout() {
        let client = GatewayClient::new(&GatewaySettings::default());
        assert_eq!(client.timeout_for(CommandKind::Ruc), Duration::from_secs(90));
        assert_eq!(client.timeout_for(CommandKind::Dni), Duration::from_secs(30));
    }
}
