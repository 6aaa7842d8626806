use std::sync::Arc;

use service::{auth::AdminAuthService, ContentService, MediaService};

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
    pub media: Arc<MediaService>,
    pub auth: Arc<AdminAuthService>,
}
