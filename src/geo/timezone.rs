//! Coordinate to timezone lookup

use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

/// Finder data is large; build it once per process
static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Maps a coordinate pair to candidate IANA timezone names
pub trait TimezoneLookup: Send + Sync {
    /// Candidates in lookup order; empty when the point matches no zone
    fn candidates(&self, latitude: f64, longitude: f64) -> Vec<String>;

    /// First candidate, if any
    fn first(&self, latitude: f64, longitude: f64) -> Option<String> {
        self.candidates(latitude, longitude).into_iter().next()
    }
}

/// Polygon-based lookup backed by `tzf-rs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TzfLookup;

impl TimezoneLookup for TzfLookup {
    fn candidates(&self, latitude: f64, longitude: f64) -> Vec<String> {
        FINDER
            .get_tz_names(longitude, latitude)
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<&'static str>);

    impl TimezoneLookup for Fixed {
        fn candidates(&self, _latitude: f64, _longitude: f64) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    #[test]
    fn test_first_takes_lookup_order() {
        let lookup = Fixed(vec!["Europe/Berlin", "Europe/Zurich"]);
        assert_eq!(lookup.first(47.5, 8.6), Some("Europe/Berlin".to_string()));
    }

    #[test]
    fn test_first_without_candidates() {
        assert_eq!(Fixed(vec![]).first(0.0, 0.0), None);
    }

    #[test]
    fn test_tzf_lookup_new_york() {
        let tz = TzfLookup.first(40.7128, -74.0060);
        assert_eq!(tz.as_deref(), Some("America/New_York"));
    }
}
