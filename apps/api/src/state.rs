use std::sync::Arc;

use crate::analysis::service::CvAnalyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable CV analyzer. `None` when no API key is configured; the analyze
    /// route then answers with a configuration error.
    pub analyzer: Option<Arc<dyn CvAnalyzer>>,
}

#[cfg(test)]
impl AppState {
    /// Default config (no env lookups) with the given analyzer.
    pub(crate) fn for_tests(analyzer: Option<Arc<dyn CvAnalyzer>>) -> Self {
        Self {
            config: Config::from_lookup(|_| None).expect("default config is valid"),
            analyzer,
        }
    }
}
