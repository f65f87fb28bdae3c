use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use wayfare_offer::{FallbackReason, OfferSource};

use crate::error::AppError;
use crate::state::AppState;

/// Search counters, registered on a private registry so tests can build
/// as many app instances as they like.
pub struct SearchMetrics {
    registry: Registry,
    searches: IntCounterVec,
    upstream_failures: IntCounterVec,
}

impl SearchMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let searches = IntCounterVec::new(
            Opts::new("wayfare_search_requests_total", "Searches served, by domain and offer source"),
            &["domain", "source"],
        )?;
        let upstream_failures = IntCounterVec::new(
            Opts::new("wayfare_upstream_failures_total", "Upstream failures absorbed by the synthetic fallback"),
            &["domain"],
        )?;

        registry.register(Box::new(searches.clone()))?;
        registry.register(Box::new(upstream_failures.clone()))?;

        Ok(Self {
            registry,
            searches,
            upstream_failures,
        })
    }

    pub fn record(&self, domain: &str, source: OfferSource, fallback_reason: Option<FallbackReason>) {
        let source = match source {
            OfferSource::Upstream => "upstream",
            OfferSource::Synthetic => "synthetic",
        };
        self.searches.with_label_values(&[domain, source]).inc();
        if fallback_reason == Some(FallbackReason::UpstreamFailure) {
            self.upstream_failures.with_label_values(&[domain]).inc();
        }
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render().map_err(|e| AppError::Anyhow(e.into()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_render_with_labels() {
        let metrics = SearchMetrics::new().unwrap();
        metrics.record("flights", OfferSource::Synthetic, Some(FallbackReason::UpstreamFailure));
        metrics.record("hotels", OfferSource::Upstream, None);

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"wayfare_search_requests_total{domain="flights",source="synthetic"} 1"#));
        assert!(text.contains(r#"wayfare_search_requests_total{domain="hotels",source="upstream"} 1"#));
        assert!(text.contains(r#"wayfare_upstream_failures_total{domain="flights"} 1"#));
    }

    #[test]
    fn test_empty_or_unsupported_is_not_a_failure() {
        let metrics = SearchMetrics::new().unwrap();
        metrics.record("cars", OfferSource::Synthetic, Some(FallbackReason::EmptyResult));
        metrics.record("apartments", OfferSource::Synthetic, Some(FallbackReason::NoInventory));

        let text = metrics.render().unwrap();
        assert!(!text.contains(r#"wayfare_upstream_failures_total{domain="cars"}"#));
        assert!(!text.contains(r#"wayfare_upstream_failures_total{domain="apartments"}"#));
    }
}
