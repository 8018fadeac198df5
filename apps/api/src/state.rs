use std::sync::Arc;

use crate::config::Config;
use crate::cv::store::CvStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CvStore>,
    pub config: Config,
}
