//! Contract between the retry ladder and an external routing engine.

use std::fmt;
use std::future::Future;

use crate::models::{GeoPoint, RoutedPath, RoutingPreferences};

/// Why a routing call did not produce a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayFailure {
    /// HTTP status, `None` when the request never got a response.
    pub status: Option<u16>,
    pub message: String,
}

impl GatewayFailure {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Rejected credentials or exhausted quota; retrying will not help the user.
    pub fn is_authorization(&self) -> bool {
        matches!(self.status, Some(401 | 403 | 429))
    }
}

impl fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "no response: {}", self.message),
        }
    }
}

/// Result of one routing call. Failures are data, not errors: they drive the
/// retry ladder.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome {
    Success(RoutedPath),
    Failure(GatewayFailure),
    /// No credentials configured; no call was attempted.
    Unconfigured,
}

/// A road-snapping directions service.
///
/// Implementations must not retry on their own.
pub trait RoutingGateway: Send + Sync {
    fn directions(
        &self,
        waypoints: &[GeoPoint],
        preferences: &RoutingPreferences,
    ) -> impl Future<Output = GatewayOutcome> + Send;
}
