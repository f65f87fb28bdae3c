use serde::{Deserialize, Serialize};

// ============================================================================
// IATA location codes
// ============================================================================

/// True for a well-formed 3-letter uppercase IATA-style code ("PAR", "JFK").
pub fn is_location_code(value: &str) -> bool {
    value.len() == 3 && value.bytes().all(|b| b.is_ascii_uppercase())
}

/// Kind of place returned by a location lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationKind {
    City,
    Airport,
    Other,
}

/// A single candidate returned by the location lookup adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMatch {
    pub iata_code: Option<String>,
    pub name: String,
    pub kind: LocationKind,
}

impl LocationMatch {
    /// The candidate's code, if it is a usable 3-letter code.
    pub fn valid_code(&self) -> Option<&str> {
        self.iata_code.as_deref().filter(|code| is_location_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_code_shape() {
        assert!(is_location_code("PAR"));
        assert!(is_location_code("JFK"));
        assert!(!is_location_code("par"));
        assert!(!is_location_code("Paris"));
        assert!(!is_location_code("PA"));
        assert!(!is_location_code("PA1"));
        assert!(!is_location_code(""));
        assert!(!is_location_code("ÉTÉ"));
    }

    #[test]
    fn test_valid_code_filters_blank_codes() {
        let blank = LocationMatch {
            iata_code: Some(String::new()),
            name: "Somewhere".to_string(),
            kind: LocationKind::Other,
        };
        assert_eq!(blank.valid_code(), None);

        let paris = LocationMatch {
            iata_code: Some("PAR".to_string()),
            name: "Paris".to_string(),
            kind: LocationKind::City,
        };
        assert_eq!(paris.valid_code(), Some("PAR"));
    }
}
