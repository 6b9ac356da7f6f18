use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::TokenError;
use crate::database::{with_deadline, IdentityStore};

/// Enforces at-most-once use of a delegation token. The transition is a
/// compare-and-set in the store, so concurrent callers cannot both win.
pub struct TokenConsumptionLedger<'a> {
    store: &'a dyn IdentityStore,
    timeout: Duration,
}

impl<'a> TokenConsumptionLedger<'a> {
    pub fn new(store: &'a dyn IdentityStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mark the token consumed. Replays and unknown ids report
    /// `ConsumptionConflict`; callers must not apply effects twice.
    pub async fn consume(&self, token_id: Uuid) -> Result<(), TokenError> {
        let consumed = with_deadline(self.timeout, self.store.consume_token(token_id, Utc::now())).await?;

        if !consumed {
            warn!("Rejected consumption of token {}: already consumed or unknown", token_id);
            return Err(TokenError::ConsumptionConflict(token_id));
        }

        info!("Consumed delegation token {}", token_id);
        Ok(())
    }
}
