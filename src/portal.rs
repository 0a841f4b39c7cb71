//! Portal automation driver over chromiumoxide (CDP).
//!
//! A [`PortalSession`] is an exclusively-owned, single-use browser session.
//! The dispatcher's single worker guarantees at most one exists at a time;
//! the driver itself only guarantees bounded waits per step and that
//! [`PortalSession::close`] tears the whole thing down. Workflows must call
//! `close` on every exit path once a launch has succeeded — the consuming
//! signature makes reuse after teardown impossible.

use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::debug;

use crate::config::BrowserSettings;
use crate::error::SessionError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Named states of one workflow invocation, traced on every transition.
///
/// `ConfirmCheck` failing (no confirm control within the probe window) is a
/// valid terminal branch meaning "no result", not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Launching,
    Authenticating,
    ModalCheck,
    Navigating,
    InputtingQuery,
    Submitting,
    ConfirmCheck,
    Extracting,
    Closed,
}

pub struct PortalSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    state: SessionState,
    nav_timeout: Duration,
    element_timeout: Duration,
    probe_timeout: Duration,
}

impl PortalSession {
    /// Launch an isolated browser and open a blank page.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, SessionError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--ignore-certificate-errors");
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // The handler stream must be polled for the browser to function.
        let handler = tokio::spawn(async move { while let Some(_event) = handler.next().await {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        debug!(headless = settings.headless, "portal session launched");
        Ok(Self {
            browser,
            page,
            handler,
            state: SessionState::Launching,
            nav_timeout: Duration::from_secs(settings.nav_timeout_secs),
            element_timeout: Duration::from_secs(settings.element_timeout_secs),
            probe_timeout: Duration::from_secs(settings.probe_timeout_secs),
        })
    }

    /// Record a state-machine transition.
    pub fn enter(&mut self, state: SessionState) {
        debug!(from = ?self.state, to = ?state, "session state");
        self.state = state;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Override the session user agent before the first navigation.
    pub async fn set_user_agent(&self, user_agent: &str) -> Result<(), SessionError> {
        let params = SetUserAgentOverrideParams::builder()
            .user_agent(user_agent)
            .build()
            .map_err(SessionError::Launch)?;
        self.page.execute(params).await?;
        Ok(())
    }

    /// Navigate, bounded by the configured navigation timeout.
    pub async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        debug!(url, "navigating");
        timeout(self.nav_timeout, self.page.goto(url))
            .await
            .map_err(|_| SessionError::StepTimeout("navigation"))?
            .map_err(|source| SessionError::Navigation {
                url: url.to_string(),
                source,
            })?;
        Ok(())
    }

    /// Poll for a selector until it appears or the wait elapses.
    async fn find(&self, selector: &str, wait: Duration) -> Result<Element, SessionError> {
        let deadline = Instant::now() + wait;
        loop {
            match self.page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(_) if Instant::now() < deadline => sleep(POLL_INTERVAL).await,
                Err(_) => return Err(SessionError::ElementNotFound(selector.to_string())),
            }
        }
    }

    /// Wait for a required element to render.
    pub async fn wait_for(&mut self, selector: &str, wait: Duration) -> Result<(), SessionError> {
        self.find(selector, wait).await.map(|_| ())
    }

    /// Click a required element.
    pub async fn click(&mut self, selector: &str) -> Result<(), SessionError> {
        let element = self.find(selector, self.element_timeout).await?;
        element.click().await?;
        Ok(())
    }

    /// Probe for an optional element and click it if present. Absence is
    /// reported as `false`, never as an error.
    pub async fn try_click(&mut self, selector: &str) -> bool {
        match self.find(selector, self.probe_timeout).await {
            Ok(element) => element.click().await.is_ok(),
            Err(_) => false,
        }
    }

    /// Focus a required input and type into it.
    pub async fn type_into(&mut self, selector: &str, text: &str) -> Result<(), SessionError> {
        let element = self.find(selector, self.element_timeout).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    /// Click the first element under `selector` whose text contains
    /// `label`. Required: polls within the element timeout like
    /// [`Self::click`] and errors once it elapses without a match.
    pub async fn click_matching(&self, selector: &str, label: &str) -> Result<(), SessionError> {
        let script = matching_click_script(selector, label);
        if poll_outcome(self.element_timeout, || self.eval::<bool>(&script)).await? {
            Ok(())
        } else {
            Err(SessionError::ElementNotFound(format!("{selector} '{label}'")))
        }
    }

    /// Optional variant of [`Self::click_matching`]: probes briefly and
    /// treats both absence and script failure as "not clicked".
    pub async fn try_click_matching(&self, selector: &str, label: &str) -> bool {
        let script = matching_click_script(selector, label);
        matches!(
            poll_outcome(self.probe_timeout, || self.eval::<bool>(&script)).await,
            Ok(true)
        )
    }

    /// Full rendered text of the current page.
    pub async fn body_text(&mut self) -> Result<String, SessionError> {
        self.eval("document.body.innerText").await
    }

    /// Evaluate a script and deserialize its result.
    pub async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, SessionError> {
        let result = timeout(self.element_timeout, self.page.evaluate(script))
            .await
            .map_err(|_| SessionError::StepTimeout("script evaluation"))??;
        result
            .into_value()
            .map_err(|e| SessionError::Script(e.to_string()))
    }

    /// Let a slow render settle, mirroring the portals' animation delays.
    pub async fn settle(&self, delay: Duration) {
        sleep(delay).await;
    }

    /// Tear the session down. Teardown problems are logged and swallowed
    /// so workflow results survive them.
    pub async fn close(mut self) {
        self.enter(SessionState::Closed);
        if let Err(err) = self.page.close().await {
            debug!(%err, "page close failed");
        }
        if let Err(err) = self.browser.close().await {
            debug!(%err, "browser close failed");
        }
        self.handler.abort();
    }
}

fn matching_click_script(selector: &str, label: &str) -> String {
    format!(
        r#"(() => {{
            const nodes = Array.from(document.querySelectorAll('{selector}'));
            const target = nodes.find(n => n.textContent.includes('{label}'));
            if (target) {{ target.click(); return true; }}
            return false;
        }})()"#
    )
}

/// Re-run `attempt` every poll interval until it reports a hit or `wait`
/// elapses; once the deadline passes, the last outcome is returned as-is.
async fn poll_outcome<F, Fut>(wait: Duration, mut attempt: F) -> Result<bool, SessionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, SessionError>>,
{
    let deadline = Instant::now() + wait;
    loop {
        let outcome = attempt().await;
        if matches!(outcome, Ok(true)) || Instant::now() >= deadline {
            return outcome;
        }
        sleep(POLL_INTERVAL).await;
    }
}
