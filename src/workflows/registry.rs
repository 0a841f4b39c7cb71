//! Business-registry lookup: tax registry (primary) merged with the phone
//! directory (secondary).
//!
//! The two portals are queried strictly one after the other — both are
//! browser-driven and subject to the single-session rule. Either arm may
//! fail on its own; the merged report always comes back, with the failed
//! section degraded to "not available".

use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::SessionError;
use crate::extract::{self, RegistryRecord, UNKNOWN};
use crate::portal::{PortalSession, SessionState};

const REPRESENTATIVE_ROW_JS: &str = r#"(() => {
    const row = document.querySelector('tbody tr');
    if (!row) return [];
    return Array.from(row.querySelectorAll('td')).map(td => td.textContent.trim());
})()"#;

const DIRECTORY_INFO_JS: &str =
    r#"document.querySelector('#data-table_info')?.textContent ?? ''"#;

const DIRECTORY_CELLS_JS: &str = r#"(() => {
    const body = document.querySelector('#data-table tbody');
    if (!body) return [];
    return Array.from(body.querySelectorAll('tr'))
        .map(row => row.querySelectorAll('td'))
        .filter(cells => cells.length >= 5)
        .map(cells => cells[4].textContent.trim());
})()"#;

/// Merged dual-source report.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryReport {
    pub ruc: String,
    pub record: Option<RegistryRecord>,
    pub phones: Vec<String>,
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { UNKNOWN } else { value }
}

impl RegistryReport {
    pub fn render(&self) -> String {
        let mut out = format!("*Consulta RUC: {}*\n\n", self.ruc);
        match &self.record {
            Some(r) => {
                out.push_str(&format!(
                    "*DATOS SUNAT:*\n\
                     Razón Social: {}\n\
                     Estado: {}\n\
                     Representante: {}\n\
                     DNI: {}\n\
                     Dirección: {}\n\
                     Distrito: {}\n\
                     Provincia: {}\n\
                     Departamento: {}\n\n",
                    or_dash(&r.legal_name),
                    or_dash(&r.taxpayer_status),
                    or_dash(&r.representative_name),
                    or_dash(&r.representative_id),
                    or_dash(&r.address),
                    or_dash(&r.district),
                    or_dash(&r.province),
                    or_dash(&r.department),
                ));
            }
            None => out.push_str("*DATOS SUNAT:* No disponible\n\n"),
        }
        let phones = if self.phones.is_empty() {
            "Sin registro".to_string()
        } else {
            self.phones.join(" / ")
        };
        out.push_str(&format!("*TELÉFONO ENTEL:* {phones}"));
        out
    }
}

/// Run both registry sources sequentially and merge their results.
///
/// Never fails: each source degrades independently.
pub async fn lookup_ruc(config: &Config, ruc: &str) -> RegistryReport {
    let record = match primary_lookup(config, ruc).await {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(%err, "registry source failed");
            None
        }
    };
    let phones = match phone_lookup(config, ruc).await {
        Ok(phones) => phones,
        Err(err) => {
            warn!(%err, "phone directory source failed");
            Vec::new()
        }
    };
    RegistryReport {
        ruc: ruc.to_string(),
        record,
        phones,
    }
}

/// Tax-registry arm: public portal, identifier search, result panel, plus
/// an optional legal-representative detail fetch.
async fn primary_lookup(config: &Config, ruc: &str) -> Result<RegistryRecord, SessionError> {
    let mut session = PortalSession::launch(&config.browser).await?;
    let outcome = run_primary(&mut session, config, ruc).await;
    session.close().await;
    outcome
}

async fn run_primary(
    session: &mut PortalSession,
    config: &Config,
    ruc: &str,
) -> Result<RegistryRecord, SessionError> {
    session.set_user_agent(&config.registry.user_agent).await?;

    session.enter(SessionState::Navigating);
    session.goto(&config.registry.url).await?;

    session.enter(SessionState::InputtingQuery);
    if session.try_click("#btnPorRuc").await {
        session.settle(Duration::from_millis(500)).await;
    }
    session.type_into("#txtRuc", ruc).await?;

    session.enter(SessionState::Submitting);
    session.click("#btnAceptar").await?;
    session
        .wait_for("h4.list-group-item-heading", Duration::from_secs(10))
        .await?;

    session.enter(SessionState::Extracting);
    let page_text = session.body_text().await?;
    let mut record = extract::registry_record(&page_text)
        .ok_or_else(|| SessionError::ElementNotFound("registry result panel".into()))?;

    // Representative detail is behind an extra button that some records
    // simply do not have.
    if session.try_click("button.btnInfRepLeg").await {
        session.settle(Duration::from_secs(1)).await;
        match session.eval::<Vec<String>>(REPRESENTATIVE_ROW_JS).await {
            Ok(cells) if cells.len() >= 3 => {
                record.representative_id = format!("{} {}", cells[0], cells[1]);
                record.representative_name = cells[2].clone();
            }
            Ok(_) => debug!("representative table empty"),
            Err(err) => debug!(%err, "representative detail unavailable"),
        }
    }
    Ok(record)
}

/// Phone-directory arm: authenticated portal, identifier filter, tabular
/// result. "0 to 0" in the counter is the expected no-rows branch.
async fn phone_lookup(config: &Config, ruc: &str) -> Result<Vec<String>, SessionError> {
    let mut session = PortalSession::launch(&config.browser).await?;
    let outcome = run_phones(&mut session, config, ruc).await;
    session.close().await;
    outcome
}

async fn run_phones(
    session: &mut PortalSession,
    config: &Config,
    ruc: &str,
) -> Result<Vec<String>, SessionError> {
    session.enter(SessionState::Authenticating);
    session.goto(&config.directory.login_url).await?;
    session.type_into("#Email", &config.directory.username).await?;
    session
        .type_into("#Password", &config.directory.password)
        .await?;
    session.click("#btnLgn").await?;
    session.settle(Duration::from_secs(3)).await;

    session.enter(SessionState::Navigating);
    session.goto(&config.directory.operations_url).await?;

    session.enter(SessionState::InputtingQuery);
    session.type_into("#ruc", ruc).await?;

    session.enter(SessionState::Submitting);
    session.click("#filter").await?;
    session.settle(Duration::from_secs(3)).await;

    session.enter(SessionState::Extracting);
    let info: String = session.eval(DIRECTORY_INFO_JS).await?;
    if info.contains("0 to 0") {
        return Ok(Vec::new());
    }
    let cells: Vec<String> = session.eval(DIRECTORY_CELLS_JS).await?;
    Ok(extract::select_phone_numbers(cells))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> RegistryRecord {
        RegistryRecord {
            legal_name: "ACME PERU S.A.C.".into(),
            taxpayer_status: "ACTIVO".into(),
            address: "AV. AREQUIPA NRO. 1234".into(),
            department: "LIMA".into(),
            province: "LIMA".into(),
            district: "SAN ISIDRO".into(),
            representative_name: "JUAN PEREZ".into(),
            representative_id: "DNI 12345678".into(),
        }
    }

    #[test]
    fn full_report_renders_both_sections() {
        let report = RegistryReport {
            ruc: "20123456789".into(),
            record: Some(sample_record()),
            phones: vec!["987654321".into(), "912345678".into()],
        };
        let rendered = report.render();
        assert!(rendered.contains("*Consulta RUC: 20123456789*"));
        assert!(rendered.contains("Razón Social: ACME PERU S.A.C."));
        assert!(rendered.contains("Representante: JUAN PEREZ"));
        assert!(rendered.contains("*TELÉFONO ENTEL:* 987654321 / 912345678"));
    }

    #[test]
    fn missing_primary_source_degrades_to_not_available() {
        let report = RegistryReport {
            ruc: "20123456789".into(),
            record: None,
            phones: vec!["987654321".into()],
        };
        let rendered = report.render();
        assert!(rendered.contains("*DATOS SUNAT:* No disponible"));
        assert!(rendered.contains("*TELÉFONO ENTEL:* 987654321"));
    }

    #[test]
    fn empty_phone_section_says_sin_registro() {
        let report = RegistryReport {
            ruc: "20123456789".into(),
            record: Some(sample_record()),
            phones: Vec::new(),
        };
        assert!(report.render().contains("*TELÉFONO ENTEL:* Sin registro"));
    }

    #[test]
    fn empty_record_fields_render_as_unknown() {
        let report = RegistryReport {
            ruc: "20123456789".into(),
            record: Some(RegistryRecord {
                legal_name: "SOLO NOMBRE S.A.".into(),
                ..Default::default()
            }),
            phones: Vec::new(),
        };
        let rendered = report.render();
        assert!(rendered.contains("Representante: ---"));
        assert!(rendered.contains("Dirección: ---"));
    }
}
