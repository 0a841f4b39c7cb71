//! coverbot — a single-flight lookup bot for stateful, authenticated web
//! portals.
//!
//! Inbound text commands are serialized through a FIFO queue with exactly
//! one worker; each command resolves to either a browser-driven portal
//! workflow (chromiumoxide over CDP) or a call to a peer scraping service.
//! Rendered page text is turned into typed records by the pure rules in
//! [`extract`], and replies go out through the pluggable [`messenger`]
//! surface.

pub mod commands;
pub mod config;
pub mod coords;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod logging;
pub mod messenger;
pub mod portal;
pub mod workflows;
