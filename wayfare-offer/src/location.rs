use std::sync::Arc;

use tracing::{debug, warn};
use wayfare_core::iata::is_location_code;
use wayfare_core::supplier::LocationLookup;

/// Turns free-text places into 3-letter codes.
#[derive(Clone)]
pub struct LocationResolver {
    lookup: Arc<dyn LocationLookup>,
}

impl LocationResolver {
    pub fn new(lookup: Arc<dyn LocationLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve `keyword` to a location code. Never fails.
    ///
    /// Well-formed codes pass through without a lookup. When the lookup errors
    /// or has no candidate with a valid code, the trimmed keyword itself is
    /// returned, so callers must accept unresolved free text.
    pub async fn resolve_code(&self, keyword: &str) -> String {
        let keyword = keyword.trim();
        if is_location_code(keyword) {
            return keyword.to_string();
        }

        match self.lookup.lookup(keyword).await {
            Ok(matches) => match matches.iter().find_map(|m| m.valid_code()) {
                Some(code) => {
                    debug!("Resolved '{}' to {}", keyword, code);
                    code.to_string()
                }
                None => {
                    debug!("No location code for '{}'", keyword);
                    keyword.to_string()
                }
            },
            Err(e) => {
                warn!("Location lookup for '{}' failed: {}", keyword, e);
                keyword.to_string()
            }
        }
    }
}
