//! Deployment-time configuration source.

use crate::BoxFuture;
use idconsole_shared::Result;

/// Raw response of a deployment config fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfigResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, unparsed.
    pub body: String,
}

impl DeploymentConfigResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Source of the deployment config document.
///
/// Transport failures are reported as `Err`; any HTTP response, including
/// 4xx/5xx, is `Ok` with its status.
pub trait DeploymentConfigPort: Send + Sync {
    /// Fetch the document once, bypassing intermediate caches.
    fn fetch(&self) -> BoxFuture<'_, Result<DeploymentConfigResponse>>;
}
