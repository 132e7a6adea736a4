//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use docvault_core::types::UserId;

/// Context for the current request.
///
/// The caller authenticates the user; this core only records who acted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID, recorded as `uploaded_by`.
    pub user_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context stamped with the current time.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            request_time: Utc::now(),
        }
    }

    /// Context for operator actions with no real user behind them.
    pub fn system() -> Self {
        Self::new(UserId::from_uuid(Uuid::nil()))
    }
}
