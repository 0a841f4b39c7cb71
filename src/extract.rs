//! Pattern rules that turn rendered portal text into typed records.
//!
//! Everything here is pure text-in/record-out: the session drivers hand over
//! `document.body.innerText` (or table cell lists) and the rules below fill
//! in whatever fields they can find. Coverage matching is done on an
//! upper-cased copy of the page; a field whose rule finds nothing stays at
//! the `---` sentinel. Rules are independent of each other, so each one
//! re-scans the full text and a greedy match can never swallow a neighbour's
//! label.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Sentinel for a field the page did not yield.
pub const UNKNOWN: &str = "---";

/// Canonical coverage marker in the portals' result panels.
const COVERED_MARKER: &str = "CON COBERTURA";

/// Coverage verdict. Status text is derived from this enum, never taken
/// verbatim from the page, so a parse artifact cannot leak into replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageStatus {
    Covered { qualifier: Option<String> },
    NotCovered,
}

impl CoverageStatus {
    pub fn is_covered(&self) -> bool {
        matches!(self, CoverageStatus::Covered { .. })
    }

    /// `SI` / `NO` marker used in reply headers.
    pub fn as_si_no(&self) -> &'static str {
        if self.is_covered() { "SI" } else { "NO" }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageStatus::Covered { qualifier: Some(q) } => {
                write!(f, "{COVERED_MARKER} ({q})")
            }
            CoverageStatus::Covered { qualifier: None } => f.write_str(COVERED_MARKER),
            CoverageStatus::NotCovered => f.write_str("SIN COBERTURA"),
        }
    }
}

/// Result of the delivery-coverage lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryCoverage {
    pub district: String,
    pub plan_code: String,
    pub toa_zone: String,
    pub color_band: String,
    pub status: CoverageStatus,
    pub schedule: String,
}

impl Default for DeliveryCoverage {
    fn default() -> Self {
        Self {
            district: UNKNOWN.into(),
            plan_code: UNKNOWN.into(),
            toa_zone: UNKNOWN.into(),
            color_band: UNKNOWN.into(),
            status: CoverageStatus::NotCovered,
            schedule: UNKNOWN.into(),
        }
    }
}

/// Result of the internet-coverage lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct InternetCoverage {
    pub has_coverage: bool,
    pub plan_code: String,
    pub technology: String,
    pub speed: String,
    pub vendor: String,
    pub status: CoverageStatus,
}

impl Default for InternetCoverage {
    fn default() -> Self {
        Self {
            has_coverage: false,
            plan_code: UNKNOWN.into(),
            technology: UNKNOWN.into(),
            speed: UNKNOWN.into(),
            vendor: UNKNOWN.into(),
            status: CoverageStatus::NotCovered,
        }
    }
}

/// Record scraped from the tax-registry result panel. Empty strings mean
/// "not found"; rendering maps them to [`UNKNOWN`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryRecord {
    pub legal_name: String,
    pub taxpayer_status: String,
    pub address: String,
    pub department: String,
    pub province: String,
    pub district: String,
    pub representative_name: String,
    pub representative_id: String,
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].trim().to_string())
}

/// First vocabulary term found verbatim in the text wins, in vocabulary
/// order. Ties between terms present simultaneously are resolved by the
/// listing order, which is a declared policy rather than portal behavior.
fn first_term(text: &str, vocabulary: &[&str]) -> Option<String> {
    vocabulary
        .iter()
        .find(|term| text.contains(*term))
        .map(|term| (*term).to_string())
}

fn coverage_status(text: &str) -> CoverageStatus {
    static QUALIFIER: OnceLock<Regex> = OnceLock::new();
    if !text.contains(COVERED_MARKER) {
        return CoverageStatus::NotCovered;
    }
    let qualifier = capture(
        regex(&QUALIFIER, r"CON COBERTURA\s*\(([^)]+)\)"),
        text,
    );
    CoverageStatus::Covered { qualifier }
}

/// Apply the delivery-coverage rule set to rendered page text.
pub fn delivery_coverage(page_text: &str) -> DeliveryCoverage {
    static DISTRICT: OnceLock<Regex> = OnceLock::new();
    static PLAN: OnceLock<Regex> = OnceLock::new();
    static TOA: OnceLock<Regex> = OnceLock::new();

    let text = page_text.to_uppercase();
    let mut result = DeliveryCoverage::default();

    if let Some(district) = capture(
        regex(
            &DISTRICT,
            r"DISTRITO\s*:?\s*([A-ZÁÉÍÓÚÑ\s]+?)(?:PLANO|ZONA|COLOR|$)",
        ),
        &text,
    ) {
        result.district = district;
    }
    if let Some(plan) = capture(regex(&PLAN, r"PLANO\s*:?\s*([A-Z0-9\-]+)"), &text) {
        result.plan_code = plan;
    }
    if let Some(zone) = capture(regex(&TOA, r"ZONA[_\s]*TOA[\s:]*(\d+)"), &text) {
        result.toa_zone = zone;
    }
    if let Some(color) = first_term(
        &text,
        &["AZUL", "CELESTE", "VERDE", "AMARILLO", "ROJO", "NARANJA"],
    ) {
        result.color_band = color;
    }
    result.status = coverage_status(&text);
    if text.contains("LUNES A DOMINGO") {
        result.schedule = "LUNES A DOMINGO".into();
    } else if text.contains("LUNES A VIERNES") {
        result.schedule = "LUNES A VIERNES".into();
    }
    result
}

/// Apply the internet-coverage rule set to rendered page text.
pub fn internet_coverage(page_text: &str) -> InternetCoverage {
    static PLAN: OnceLock<Regex> = OnceLock::new();
    static SPEED: OnceLock<Regex> = OnceLock::new();

    let text = page_text.to_uppercase();
    let mut result = InternetCoverage::default();

    result.status = coverage_status(&text);
    result.has_coverage = result.status.is_covered();

    if let Some(plan) = capture(regex(&PLAN, r"PLANO[:\s]*([A-Z0-9\-]+)"), &text) {
        result.plan_code = plan;
    }
    if let Some(tech) = first_term(&text, &["FTTH", "HFC", "IFI 5G", "IFI LIMITADO", "COBRE"]) {
        result.technology = tech;
    }
    if let Some(speed) = capture(regex(&SPEED, r"VELOCIDAD[^\d]*(\d+\s*MB)"), &text) {
        result.speed = speed;
    }
    if let Some(vendor) = first_term(&text, &["HUAWEI", "ZTE", "NOKIA", "CALIX"]) {
        result.vendor = vendor;
    }
    result
}

/// The value following a `Label:` line: the remainder of the same line when
/// present, otherwise the next non-empty line.
fn value_after(lines: &[&str], index: usize) -> String {
    let line = lines[index];
    if let Some((_, rest)) = line.split_once(':') {
        let rest = rest.trim();
        if !rest.is_empty() {
            return rest.to_string();
        }
    }
    lines[index + 1..]
        .iter()
        .find(|l| !l.is_empty())
        .map(|l| l.to_string())
        .unwrap_or_default()
}

/// Parse the tax-registry result panel.
///
/// Returns `None` when the `<11 digits> - LEGAL NAME` heading is absent,
/// which is how the portal renders an unknown identifier.
pub fn registry_record(page_text: &str) -> Option<RegistryRecord> {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    let heading = regex(&HEADING, r"^\d{11}\s*-\s*(.+)$");

    let lines: Vec<&str> = page_text.lines().map(str::trim).collect();
    let mut record = RegistryRecord::default();
    let mut found = false;

    for (index, line) in lines.iter().enumerate() {
        if !found {
            if let Some(captures) = heading.captures(line) {
                record.legal_name = captures[1].trim().to_string();
                found = true;
                continue;
            }
        }
        if line.contains("Estado del Contribuyente") {
            record.taxpayer_status = value_after(&lines, index).to_uppercase();
        }
        if line.contains("Domicilio Fiscal") {
            let value = value_after(&lines, index);
            let parts: Vec<&str> = value.split(" - ").collect();
            if parts.len() >= 3 {
                record.district = parts[parts.len() - 1].trim().to_string();
                record.province = parts[parts.len() - 2].trim().to_string();
                record.department = parts[parts.len() - 3].trim().to_string();
                record.address = parts[..parts.len() - 3].join(" - ").trim().to_string();
            } else {
                record.address = value;
            }
        }
    }

    found.then_some(record)
}

/// Pick the subscriber numbers out of directory table cells: strip spaces
/// and dashes, keep all-digit entries of 8+ digits, drop duplicates, and
/// return the last two in table order.
pub fn select_phone_numbers(cells: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::new();
    for cell in cells {
        let cleaned: String = cell.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        if cleaned.len() >= 8
            && cleaned.chars().all(|c| c.is_ascii_digit())
            && !numbers.contains(&cleaned)
        {
            numbers.push(cleaned);
        }
    }
    let keep = numbers.len().saturating_sub(2);
    numbers.split_off(keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELIVERY_PAGE: &str = "Resultado de la consulta\n\
        DISTRITO: SAN ISIDRO PLANO AB-12\n\
        ZONA_TOA 14\n\
        COLOR AZUL\n\
        CON COBERTURA (LUNES A DOMINGO)\n";

    #[test]
    fn delivery_rules_fill_all_fields() {
        let result = delivery_coverage(DELIVERY_PAGE);
        assert_eq!(result.district, "SAN ISIDRO");
        assert_eq!(result.plan_code, "AB-12");
        assert_eq!(result.toa_zone, "14");
        assert_eq!(result.color_band, "AZUL");
        assert_eq!(
            result.status,
            CoverageStatus::Covered {
                qualifier: Some("LUNES A DOMINGO".into())
            }
        );
        assert_eq!(result.status.as_si_no(), "SI");
        assert_eq!(result.status.to_string(), "CON COBERTURA (LUNES A DOMINGO)");
        assert_eq!(result.schedule, "LUNES A DOMINGO");
    }

    #[test]
    fn delivery_rules_are_idempotent() {
        assert_eq!(delivery_coverage(DELIVERY_PAGE), delivery_coverage(DELIVERY_PAGE));
    }

    #[test]
    fn delivery_defaults_on_empty_page() {
        let result = delivery_coverage("nothing of interest");
        assert_eq!(result.district, UNKNOWN);
        assert_eq!(result.plan_code, UNKNOWN);
        assert_eq!(result.toa_zone, UNKNOWN);
        assert_eq!(result.color_band, UNKNOWN);
        assert_eq!(result.status, CoverageStatus::NotCovered);
        assert_eq!(result.status.to_string(), "SIN COBERTURA");
        assert_eq!(result.schedule, UNKNOWN);
    }

    #[test]
    fn coverage_without_qualifier() {
        let result = delivery_coverage("ESTADO: CON COBERTURA\nLUNES A VIERNES");
        assert_eq!(result.status, CoverageStatus::Covered { qualifier: None });
        assert_eq!(result.status.to_string(), "CON COBERTURA");
        assert_eq!(result.schedule, "LUNES A VIERNES");
    }

    #[test]
    fn color_band_takes_first_vocabulary_term() {
        // Both present: vocabulary order decides.
        let result = delivery_coverage("COLOR VERDE y tambien AZUL");
        assert_eq!(result.color_band, "AZUL");
    }

    #[test]
    fn matching_is_case_insensitive_via_uppercasing() {
        let result = delivery_coverage("distrito: miraflores zona_toa 7");
        assert_eq!(result.district, "MIRAFLORES");
        assert_eq!(result.toa_zone, "7");
    }

    #[test]
    fn internet_rules_fill_all_fields() {
        let page = "CON COBERTURA\nPLANO: XY-9\nTECNOLOGIA FTTH\nVELOCIDAD HASTA 1000 MB\nVENDOR HUAWEI";
        let result = internet_coverage(page);
        assert!(result.has_coverage);
        assert_eq!(result.plan_code, "XY-9");
        assert_eq!(result.technology, "FTTH");
        assert_eq!(result.speed, "1000 MB");
        assert_eq!(result.vendor, "HUAWEI");
        assert_eq!(result.status.to_string(), "CON COBERTURA");
    }

    #[test]
    fn internet_defaults_without_coverage_marker() {
        let result = internet_coverage("SIN RESULTADOS");
        assert!(!result.has_coverage);
        assert_eq!(result.plan_code, UNKNOWN);
        assert_eq!(result.technology, UNKNOWN);
        assert_eq!(result.speed, UNKNOWN);
        assert_eq!(result.vendor, UNKNOWN);
    }

    #[test]
    fn registry_panel_parses_heading_status_and_address() {
        let page = "Resultado de la Búsqueda\n\
            Número de RUC:\n\
            20123456789 - ACME PERU S.A.C.\n\
            Estado del Contribuyente:\n\
            Activo\n\
            Domicilio Fiscal:\n\
            AV. AREQUIPA NRO. 1234 - LIMA - LIMA - SAN ISIDRO\n";
        let record = registry_record(page).unwrap();
        assert_eq!(record.legal_name, "ACME PERU S.A.C.");
        assert_eq!(record.taxpayer_status, "ACTIVO");
        assert_eq!(record.address, "AV. AREQUIPA NRO. 1234");
        assert_eq!(record.department, "LIMA");
        assert_eq!(record.province, "LIMA");
        assert_eq!(record.district, "SAN ISIDRO");
    }

    #[test]
    fn registry_value_on_same_line_is_accepted() {
        let page = "20987654321 - EJEMPLO S.A.\nEstado del Contribuyente: Baja definitiva\n";
        let record = registry_record(page).unwrap();
        assert_eq!(record.taxpayer_status, "BAJA DEFINITIVA");
    }

    #[test]
    fn registry_without_heading_is_none() {
        assert!(registry_record("No se encontró información").is_none());
    }

    #[test]
    fn phone_selection_keeps_last_two_distinct() {
        let cells = vec![
            "01-4151234".to_string(),
            "987 654 321".to_string(),
            "987654321".to_string(),
            "912345678".to_string(),
        ];
        assert_eq!(select_phone_numbers(cells), vec!["987654321", "912345678"]);
    }

    #[test]
    fn phone_selection_drops_short_and_non_numeric_cells() {
        let cells = vec!["1234567".to_string(), "N/A".to_string(), "99887766".to_string()];
        assert_eq!(select_phone_numbers(cells), vec!["99887766"]);
    }

    #[test]
    fn phone_selection_empty_input() {
        assert!(select_phone_numbers(Vec::new()).is_empty());
    }
}
