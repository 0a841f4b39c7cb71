//! Delivery-coverage lookup on the coverage portal.

use std::time::Duration;

use crate::config::Config;
use crate::coords::Coordinates;
use crate::error::SessionError;
use crate::extract::{self, DeliveryCoverage};
use crate::portal::{PortalSession, SessionState};

use super::coverage_login;

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub coords: Coordinates,
    pub coverage: DeliveryCoverage,
}

impl DeliveryReport {
    /// The negative branch: confirm control never appeared, so the point
    /// has no delivery coverage.
    pub fn no_coverage(coords: Coordinates) -> Self {
        Self {
            coords,
            coverage: DeliveryCoverage::default(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "*Resultado de cobertura:*\n\
             Cobertura por Delivery: *{}*\n\n\
             DISTRITO: {}\n\
             PLANO: {}\n\
             ZONA_TOA: {}\n\
             COLOR: {}\n\
             ESTADO: {}\n\
             CONDICION: {}\n\n\
             Coordenadas:\n\
             Lat: {}\n\
             Lng: {}\n\n\
             _FACC_",
            self.coverage.status.as_si_no(),
            self.coverage.district,
            self.coverage.plan_code,
            self.coverage.toa_zone,
            self.coverage.color_band,
            self.coverage.status,
            self.coverage.schedule,
            self.coords.lat(),
            self.coords.lng(),
        )
    }
}

/// Run the delivery-coverage workflow for one coordinate pair.
pub async fn lookup(config: &Config, coords: Coordinates) -> Result<DeliveryReport, SessionError> {
    let mut session = PortalSession::launch(&config.browser).await?;
    let outcome = run(&mut session, config, coords).await;
    session.close().await;
    outcome
}

async fn run(
    session: &mut PortalSession,
    config: &Config,
    coords: Coordinates,
) -> Result<DeliveryReport, SessionError> {
    coverage_login(session, config).await?;

    session.enter(SessionState::Navigating);
    session
        .goto(&format!("{}cobertura-delivery", config.coverage.base_url))
        .await?;
    session.settle(Duration::from_secs(2)).await;

    session.enter(SessionState::InputtingQuery);
    session.click("#btn_search_dir").await?;
    session.settle(Duration::from_millis(1500)).await;
    session
        .click_matching(".btn_searcher_tab button", "Coordenadas")
        .await?;
    session.settle(Duration::from_secs(1)).await;
    session
        .type_into("#input_coordenadas", &coords.as_query())
        .await?;
    session.settle(Duration::from_millis(500)).await;

    session.enter(SessionState::Submitting);
    session.click("#btn_search").await?;
    session.settle(Duration::from_secs(3)).await;

    session.enter(SessionState::ConfirmCheck);
    if !session.try_click("#btn_confirmar").await {
        return Ok(DeliveryReport::no_coverage(coords));
    }
    session.settle(Duration::from_secs(2)).await;

    session.enter(SessionState::Extracting);
    let page_text = session.body_text().await?;
    Ok(DeliveryReport {
        coords,
        coverage: extract::delivery_coverage(&page_text),
    })
}
