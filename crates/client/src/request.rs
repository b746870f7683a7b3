//! Per-operation async lifecycle tracking.
//!
//! Every logical async operation a store performs (fetch products, verify
//! OTP, ...) owns one [`RequestEnvelope`]. The envelope carries the
//! operation's status, its last error, and a monotonic sequence number used
//! for stale-response suppression: a completion handler may only apply its
//! result while the [`RequestToken`] it captured at issue time is still the
//! envelope's current sequence. There is no network-level cancellation -
//! superseded responses are simply discarded when they arrive.

use serde::Serialize;

/// Status of a logical async operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Never issued (or reset).
    #[default]
    Idle,
    /// Issued, response not yet applied.
    Pending,
    /// Last issued request applied successfully.
    Succeeded,
    /// Last issued request failed; see [`RequestEnvelope::error`].
    Failed,
}

/// Proof that a completion handler belongs to a specific issuance.
///
/// Deliberately opaque: the only thing a holder can do with it is hand it
/// back to the envelope that minted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Async operation tracker: status + error + sequence number.
#[derive(Debug, Clone, Default)]
pub struct RequestEnvelope {
    status: RequestStatus,
    error: Option<String>,
    seq: u64,
}

impl RequestEnvelope {
    /// Begin a new request: bumps the sequence (logically cancelling any
    /// in-flight predecessor), clears the error, and moves to `Pending`.
    ///
    /// The returned token must be presented back by the completion handler.
    pub fn begin(&mut self) -> RequestToken {
        self.seq += 1;
        self.status = RequestStatus::Pending;
        self.error = None;
        RequestToken(self.seq)
    }

    /// Invalidate any in-flight request without issuing a new one.
    ///
    /// Used when the query identity changes (category switch, new search
    /// term): the old response must not land in the new identity's slot.
    pub fn invalidate(&mut self) {
        self.seq += 1;
        if self.status == RequestStatus::Pending {
            self.status = RequestStatus::Idle;
        }
    }

    /// Whether `token` still identifies the most recent issuance.
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.seq == token.0
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Mark the request succeeded, if `token` is still current.
    ///
    /// Returns `true` if the transition was applied; `false` means the
    /// response is stale and the caller must discard its payload too.
    pub fn succeed(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.status = RequestStatus::Succeeded;
        self.error = None;
        true
    }

    /// Mark the request failed, if `token` is still current.
    ///
    /// Returns `true` if the transition was applied.
    pub fn fail(&mut self, token: RequestToken, message: impl Into<String>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.status = RequestStatus::Failed;
        self.error = Some(message.into());
        true
    }

    /// Reset to the initial state, invalidating anything in flight.
    pub fn reset(&mut self) {
        self.seq += 1;
        self.status = RequestStatus::Idle;
        self.error = None;
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> RequestStatus {
        self.status
    }

    /// Error message from the last failed request, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_clears_previous_error() {
        let mut envelope = RequestEnvelope::default();
        let token = envelope.begin();
        assert!(envelope.fail(token, "boom"));
        assert_eq!(envelope.status(), RequestStatus::Failed);
        assert_eq!(envelope.error(), Some("boom"));

        envelope.begin();
        assert_eq!(envelope.status(), RequestStatus::Pending);
        assert_eq!(envelope.error(), None);
    }

    #[test]
    fn test_stale_token_cannot_complete() {
        let mut envelope = RequestEnvelope::default();
        let old = envelope.begin();
        let new = envelope.begin();

        assert!(!envelope.succeed(old));
        assert!(!envelope.fail(old, "late failure"));
        assert_eq!(envelope.status(), RequestStatus::Pending);

        assert!(envelope.succeed(new));
        assert_eq!(envelope.status(), RequestStatus::Succeeded);
    }

    #[test]
    fn test_invalidate_discards_in_flight() {
        let mut envelope = RequestEnvelope::default();
        let token = envelope.begin();
        envelope.invalidate();

        assert!(!envelope.is_current(token));
        assert_eq!(envelope.status(), RequestStatus::Idle);
    }

    #[test]
    fn test_younger_request_wins_regardless_of_arrival_order() {
        let mut envelope = RequestEnvelope::default();
        let first = envelope.begin();
        let second = envelope.begin();

        // Younger response arrives first.
        assert!(envelope.succeed(second));
        // Older response arrives later and must not overwrite it.
        assert!(!envelope.succeed(first));
        assert_eq!(envelope.status(), RequestStatus::Succeeded);
    }
}
