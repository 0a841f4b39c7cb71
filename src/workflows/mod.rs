//! Portal workflows and the command-to-workflow resolver.
//!
//! Each workflow pairs a fixed navigation path and selector set with an
//! extraction rule set from [`crate::extract`]. They all ride the same
//! driver: launch, authenticate, navigate, input, submit, optional confirm,
//! extract, close. A workflow never lets an error escape unformatted — the
//! public surface is "typed report or lookup-failure text".

pub mod delivery;
pub mod internet;
pub mod registry;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::error;

use crate::commands::{
    Command, CommandKind, DELIVERY_USAGE, DNI_USAGE, INTERNET_USAGE, RUC_USAGE, help_text,
};
use crate::config::Config;
use crate::coords::parse_coordinates;
use crate::dispatcher::CommandExecutor;
use crate::error::GatewayError;
use crate::gateway::{GatewayClient, PeerResult};
use crate::messenger::Reply;
use crate::portal::{PortalSession, SessionState};

/// Log into the coverage portal and clear the optional "continue session"
/// modal. Shared by the delivery and internet workflows.
pub(crate) async fn coverage_login(
    session: &mut PortalSession,
    config: &Config,
) -> Result<(), crate::error::SessionError> {
    session.enter(SessionState::Authenticating);
    session
        .goto(&format!("{}login", config.coverage.base_url))
        .await?;
    session
        .type_into("input[type=\"text\"]", &config.coverage.username)
        .await?;
    session
        .type_into("#inputPass", &config.coverage.password)
        .await?;
    session.click("button[type=\"submit\"]").await?;
    session.settle(Duration::from_secs(3)).await;

    session.enter(SessionState::ModalCheck);
    if session.try_click_matching("button", "Continuar").await {
        session.settle(Duration::from_secs(2)).await;
    }
    Ok(())
}

fn digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Resolves commands to workflows or peer-service calls. Owns the config
/// and the gateway client; browser sessions are created per lookup.
pub struct Lookups {
    config: Config,
    gateway: GatewayClient,
}

impl Lookups {
    pub fn new(config: Config) -> Self {
        let gateway = GatewayClient::new(&config.gateway);
        Self { config, gateway }
    }

    async fn delivery(&self, args: &str) -> Reply {
        let Some(coords) = parse_coordinates(args) else {
            return Reply::Text(DELIVERY_USAGE.into());
        };
        match delivery::lookup(&self.config, coords).await {
            Ok(report) => Reply::Text(report.render()),
            Err(err) => {
                error!(%err, "delivery lookup failed");
                Reply::Text(format!("Error consultando delivery: {err}"))
            }
        }
    }

    async fn internet(&self, args: &str) -> Reply {
        let Some(coords) = parse_coordinates(args) else {
            return Reply::Text(INTERNET_USAGE.into());
        };
        match internet::lookup(&self.config, coords).await {
            Ok(report) => Reply::Text(report.render()),
            Err(err) => {
                error!(%err, "internet lookup failed");
                Reply::Text(format!("Error consultando internet: {err}"))
            }
        }
    }

    async fn ruc(&self, args: &str) -> Reply {
        let ruc = digits(args);
        if ruc.len() != 11 {
            return Reply::Text(RUC_USAGE.into());
        }
        // The aggregator degrades per source and always composes a report.
        Reply::Text(registry::lookup_ruc(&self.config, &ruc).await.render())
    }

    async fn dni(&self, args: &str) -> Reply {
        let dni = digits(args);
        if dni.len() != 8 {
            return Reply::Text(DNI_USAGE.into());
        }
        match self.gateway.call(CommandKind::Dni, &dni).await {
            Ok(PeerResult::Text(text)) => Reply::Text(text),
            Ok(PeerResult::Rich { texto, foto_url }) => match foto_url {
                Some(url) => match self.gateway.fetch_image(&url).await {
                    Ok(image) => Reply::Media {
                        caption: texto,
                        image,
                    },
                    Err(err) => {
                        error!(%err, "profile photo fetch failed");
                        Reply::Text(texto)
                    }
                },
                None => Reply::Text(texto),
            },
            Err(err) => Reply::Text(peer_error_text(&err)),
        }
    }
}

fn peer_error_text(error: &GatewayError) -> String {
    match error {
        GatewayError::Unavailable => "*Error:* Servidor de scrapers no disponible\n\n\
            El servidor de consultas no está corriendo."
            .into(),
        GatewayError::Timeout => "*Error:* Timeout - consulta tardó demasiado".into(),
        GatewayError::Malformed(_) => "*Error:* Respuesta inválida del servidor".into(),
    }
}

#[async_trait]
impl CommandExecutor for Lookups {
    async fn execute(&self, command: &Command) -> Result<Reply> {
        match command.kind {
            CommandKind::Help => Ok(Reply::Text(help_text().into())),
            CommandKind::Delivery => Ok(self.delivery(&command.args).await),
            CommandKind::Internet => Ok(self.internet(&command.args).await),
            CommandKind::Ruc => Ok(self.ruc(&command.args).await),
            CommandKind::Dni => Ok(self.dni(&command.args).await),
        }
    }
}
