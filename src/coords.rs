//! Coordinate extraction from free-form message text.
//!
//! Inbound coordinates arrive as whatever the user pasted from a maps app:
//! bare `lat, lng` pairs, pin emoji, `Lat:`/`Lng:` labels, stray braces.
//! The parser strips the decoration and honours the first numeric pair it
//! finds; everything else is a parse failure and callers fall back to the
//! fixed usage message for their command.

use regex::Regex;
use std::sync::OnceLock;

/// A validated latitude/longitude pair.
///
/// Can only be built through [`Coordinates::new`] or [`parse_coordinates`],
/// so an in-range invariant holds for every live value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Build a pair, rejecting out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if lat.is_finite() && lng.is_finite() && lat.abs() <= 90.0 && lng.abs() <= 180.0 {
            Some(Self { lat, lng })
        } else {
            None
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// The `lat, lng` form the coverage portals expect in their search box.
    pub fn as_query(&self) -> String {
        format!("{}, {}", self.lat, self.lng)
    }
}

fn pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(-?\d+\.?\d*)\s*[,\s]\s*(-?\d+\.?\d*)").unwrap())
}

/// Extract the first `lat, lng` pair from noisy free-form text.
///
/// Returns `None` when no pair is present or the pair is out of geographic
/// range; partial coordinates are never produced.
pub fn parse_coordinates(input: &str) -> Option<Coordinates> {
    let cleaned: String = input
        .replace('📍', " ")
        .replace("Lat:", " ")
        .replace("Lng:", " ")
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | ',') || c.is_whitespace())
        .collect();

    let captures = pair_regex().captures(&cleaned)?;
    let lat: f64 = captures[1].parse().ok()?;
    let lng: f64 = captures[2].parse().ok()?;
    Coordinates::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_pair() {
        let coords = parse_coordinates("-12.046, -77.042").unwrap();
        assert_eq!(coords.lat(), -12.046);
        assert_eq!(coords.lng(), -77.042);
    }

    #[test]
    fn parses_labelled_and_decorated_input() {
        let coords = parse_coordinates("📍 Lat: -12.046 Lng: -77.042").unwrap();
        assert_eq!(coords.lat(), -12.046);
        assert_eq!(coords.lng(), -77.042);

        let coords = parse_coordinates("{-12.5,-76.9}").unwrap();
        assert_eq!(coords.lat(), -12.5);
        assert_eq!(coords.lng(), -76.9);
    }

    #[test]
    fn first_pair_wins() {
        let coords = parse_coordinates("-1.5, -2.5 and also 3.5, 4.5").unwrap();
        assert_eq!(coords.lat(), -1.5);
        assert_eq!(coords.lng(), -2.5);
    }

    #[test]
    fn space_separator_accepted() {
        let coords = parse_coordinates("-12.046 -77.042").unwrap();
        assert_eq!(coords.lng(), -77.042);
    }

    #[test]
    fn rejects_text_without_a_pair() {
        assert!(parse_coordinates("").is_none());
        assert!(parse_coordinates("no numbers here").is_none());
        assert!(parse_coordinates("-12.046").is_none());
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(parse_coordinates("91.0, 10.0").is_none());
        assert!(parse_coordinates("-91.0, 10.0").is_none());
        assert!(parse_coordinates("45.0, 181.0").is_none());
        assert!(Coordinates::new(90.0, 180.0).is_some());
        assert!(Coordinates::new(90.1, 0.0).is_none());
    }

    #[test]
    fn query_form_round_trips_values() {
        let coords = Coordinates::new(-12.046, -77.042).unwrap();
        assert_eq!(coords.as_query(), "-12.046, -77.042");
    }
}
