//! Error taxonomy for portal sessions and the peer-service gateway.
//!
//! Session and gateway failures are recovered at the workflow or command
//! boundary and rendered into reply text there; these types only cross
//! module seams, never the messenger surface.

use thiserror::Error;

/// A failure inside a browser-driven portal session.
///
/// Expected negative branches (a confirm control that never appears, a
/// "0 results" marker) are not errors and are handled by the workflows
/// directly; everything here aborts the lookup.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("step timed out: {0}")]
    StepTimeout(&'static str),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("browser command failed: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// A failure talking to the peer scraping service. The three cases carry
/// distinct user-facing messages, so they stay separate variants.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("peer service is not running")]
    Unavailable,

    #[error("peer service timed out")]
    Timeout,

    #[error("malformed peer response: {0}")]
    Malformed(String),
}
