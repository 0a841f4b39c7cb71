//! Internet-coverage lookup by coordinate on the coverage portal.

use std::time::Duration;

use crate::config::Config;
use crate::coords::Coordinates;
use crate::error::SessionError;
use crate::extract::{self, InternetCoverage};
use crate::portal::{PortalSession, SessionState};

use super::coverage_login;

#[derive(Debug, Clone, PartialEq)]
pub struct InternetReport {
    pub coords: Coordinates,
    pub coverage: InternetCoverage,
}

impl InternetReport {
    pub fn no_coverage(coords: Coordinates) -> Self {
        Self {
            coords,
            coverage: InternetCoverage::default(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "*Resultado de cobertura:*\n\
             Cobertura de Internet: *{}*\n\n\
             PLANO: {}\n\
             TECNOLOGIA: {}\n\
             VELOCIDAD: {}\n\
             VENDOR: {}\n\
             ESTADO: {}\n\n\
             Coordenadas:\n\
             Lat: {}\n\
             Lng: {}\n\n\
             _FACC_",
            self.coverage.status.as_si_no(),
            self.coverage.plan_code,
            self.coverage.technology,
            self.coverage.speed,
            self.coverage.vendor,
            self.coverage.status,
            self.coords.lat(),
            self.coords.lng(),
        )
    }
}

/// Run the internet-coverage workflow for one coordinate pair.
pub async fn lookup(config: &Config, coords: Coordinates) -> Result<InternetReport, SessionError> {
    let mut session = PortalSession::launch(&config.browser).await?;
    let outcome = run(&mut session, config, coords).await;
    session.close().await;
    outcome
}

async fn run(
    session: &mut PortalSession,
    config: &Config,
    coords: Coordinates,
) -> Result<InternetReport, SessionError> {
    coverage_login(session, config).await?;

    session.enter(SessionState::Navigating);
    session
        .goto(&format!(
            "{}buscar-casa-coordenada/31",
            config.coverage.base_url
        ))
        .await?;
    session.settle(Duration::from_secs(2)).await;

    session.enter(SessionState::InputtingQuery);
    session
        .type_into("#input_lat_lon", &coords.as_query())
        .await?;

    session.enter(SessionState::Submitting);
    session.click_matching("button", "Buscar").await?;
    session.settle(Duration::from_secs(3)).await;

    // No confirm control within the probe window means the portal found
    // nothing for this point; that is a result, not a failure.
    session.enter(SessionState::ConfirmCheck);
    if !session.try_click_matching("button", "Confirmar").await {
        return Ok(InternetReport::no_coverage(coords));
    }
    session.settle(Duration::from_secs(2)).await;

    session.enter(SessionState::Extracting);
    let page_text = session.body_text().await?;
    Ok(InternetReport {
        coords,
        coverage: extract::internet_coverage(&page_text),
    })
}
