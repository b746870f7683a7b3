//! Phone-OTP session lifecycle and the signed-in profile.
//!
//! The session moves through three phases: `Idle` (signed out),
//! `OtpRequested` (code sent, waiting for entry), `Verified` (signed in).
//! Verification out of order is a caller bug and is rejected synchronously,
//! before anything touches the network. The bearer token is published to
//! the shared [`RequestContext`] so the transport can decorate every
//! subsequent request, and persisted through the injected [`TokenStore`] so
//! the session survives a process restart. Storage failures downgrade to a
//! warning; the in-memory session always wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use tracing::{debug, instrument, warn};

use crate::endpoints;
use crate::error::ValidationError;
use crate::normalize;
use crate::registry::ChangeNotifier;
use crate::request::RequestEnvelope;
use crate::storage::TokenStore;
use crate::stores::toast::{NotificationBus, ToastKind};
use crate::transport::{Method, RequestContext, Transport};
use crate::types::{ProfilePatch, UserProfile, VerifiedSession};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// Signed out; no OTP outstanding.
    #[default]
    Idle,
    /// An OTP was sent and may be verified.
    OtpRequested,
    /// Signed in with a live session token.
    Verified,
}

#[derive(Debug, Default)]
struct AuthState {
    phase: AuthPhase,
    user: Option<UserProfile>,
    send_request: RequestEnvelope,
    verify_request: RequestEnvelope,
    profile_request: RequestEnvelope,
    update_request: RequestEnvelope,
}

/// Immutable auth view for screens.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub phase: AuthPhase,
    pub user: Option<UserProfile>,
    pub send_request: RequestEnvelope,
    pub verify_request: RequestEnvelope,
    pub profile_request: RequestEnvelope,
    pub update_request: RequestEnvelope,
}

impl AuthSnapshot {
    /// Whether the code-entry screen should be shown.
    #[must_use]
    pub fn otp_sent(&self) -> bool {
        self.phase == AuthPhase::OtpRequested
    }

    /// Whether the user is signed in.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.phase == AuthPhase::Verified
    }
}

/// The session slice.
#[derive(Debug)]
pub struct AuthStore<T, S> {
    inner: Arc<AuthInner<T, S>>,
}

impl<T, S> Clone for AuthStore<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct AuthInner<T, S> {
    transport: Arc<T>,
    tokens: S,
    context: RequestContext,
    state: Mutex<AuthState>,
    notices: NotificationBus,
    notifier: ChangeNotifier,
}

impl<T: Transport, S: TokenStore> AuthStore<T, S> {
    pub(crate) fn new(
        transport: Arc<T>,
        tokens: S,
        context: RequestContext,
        notices: NotificationBus,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                transport,
                tokens,
                context,
                state: Mutex::new(AuthState::default()),
                notices,
                notifier,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore a persisted session, if one exists.
    ///
    /// Call once at startup. A stored token flips the phase straight to
    /// `Verified`; the profile stays empty until
    /// [`fetch_profile`](Self::fetch_profile) fills it.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) {
        match self.inner.tokens.get().await {
            Ok(Some(token)) => {
                self.inner.context.set_bearer(Some(SecretString::from(token)));
                self.lock().phase = AuthPhase::Verified;
                self.inner.notifier.notify();
            }
            Ok(None) => debug!("no persisted session"),
            Err(e) => warn!(error = %e, "session restore failed"),
        }
    }

    /// Request an OTP for a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPhone`] for a malformed number;
    /// nothing is sent in that case.
    #[instrument(skip(self, phone))]
    pub async fn send_otp(&self, phone: &str) -> Result<(), ValidationError> {
        if !valid_phone(phone) {
            return Err(ValidationError::InvalidPhone);
        }

        let token = {
            let mut state = self.lock();
            if state.send_request.is_pending() {
                debug!("otp send already in flight");
                return Ok(());
            }
            state.send_request.begin()
        };
        self.inner.notifier.notify();

        let body = serde_json::json!({ "phone": phone });
        let result = self
            .inner
            .transport
            .request(Method::Post, endpoints::OTP_SEND, Some(body))
            .await;

        {
            let mut state = self.lock();
            match result {
                Ok(_) => {
                    if state.send_request.succeed(token) {
                        state.phase = AuthPhase::OtpRequested;
                    }
                }
                Err(e) => {
                    // Phase stays Idle; the screen re-prompts.
                    if state.send_request.fail(token, e.user_message()) {
                        warn!(error = %e, "otp send failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
        Ok(())
    }

    /// Verify an OTP and open a session.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OtpNotRequested`] when no OTP is
    /// outstanding and [`ValidationError::InvalidOtpCode`] for a malformed
    /// code; nothing is sent in either case.
    #[instrument(skip(self, phone, code))]
    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<(), ValidationError> {
        if !valid_code(code) {
            return Err(ValidationError::InvalidOtpCode);
        }

        let token = {
            let mut state = self.lock();
            if state.phase != AuthPhase::OtpRequested {
                return Err(ValidationError::OtpNotRequested);
            }
            if state.verify_request.is_pending() {
                debug!("otp verify already in flight");
                return Ok(());
            }
            state.verify_request.begin()
        };
        self.inner.notifier.notify();

        let body = serde_json::json!({ "phone": phone, "otp": code });
        let result = self
            .inner
            .transport
            .request(Method::Post, endpoints::OTP_VERIFY, Some(body))
            .await;

        let session = {
            let mut state = self.lock();
            match result.and_then(normalize::one::<VerifiedSession>) {
                Ok(session) => {
                    if state.verify_request.succeed(token) {
                        state.phase = AuthPhase::Verified;
                        state.user = Some(session.user.clone());
                        Some(session)
                    } else {
                        debug!("stale otp verification discarded");
                        None
                    }
                }
                Err(e) => {
                    // A wrong code keeps the phase at OtpRequested so the
                    // user can retry without a fresh OTP.
                    if state.verify_request.fail(token, e.user_message()) {
                        warn!(error = %e, "otp verification failed");
                    }
                    None
                }
            }
        };
        self.inner.notifier.notify();

        if let Some(session) = session {
            self.inner
                .context
                .set_bearer(Some(SecretString::from(session.token.clone())));
            if let Err(e) = self.inner.tokens.set(&session.token).await {
                warn!(error = %e, "session token not persisted");
            }
        }
        Ok(())
    }

    /// Sign out: drop the in-memory session, the published bearer, and the
    /// persisted token.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        {
            let mut state = self.lock();
            *state = AuthState::default();
        }
        self.inner.context.set_bearer(None);
        if let Err(e) = self.inner.tokens.clear().await {
            warn!(error = %e, "persisted token not cleared");
        }
        self.inner.notifier.notify();
    }

    /// Fetch the signed-in user's profile.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) {
        let token = {
            let mut state = self.lock();
            if state.profile_request.is_pending() {
                debug!("profile fetch already pending");
                return;
            }
            state.profile_request.begin()
        };
        self.inner.notifier.notify();

        let result = self
            .inner
            .transport
            .request(Method::Get, endpoints::PROFILE, None)
            .await;

        {
            let mut state = self.lock();
            match result.and_then(normalize::one::<UserProfile>) {
                Ok(user) => {
                    if state.profile_request.succeed(token) {
                        state.user = Some(user);
                    } else {
                        debug!("stale profile discarded");
                    }
                }
                Err(e) => {
                    if state.profile_request.fail(token, e.user_message()) {
                        warn!(error = %e, "profile fetch failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
    }

    /// Partially update the profile.
    ///
    /// The server responds with the fields it accepted; only those are
    /// merged into the local profile. Failures raise an error toast and
    /// leave the profile untouched.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: ProfilePatch) {
        let token = {
            let mut state = self.lock();
            if state.update_request.is_pending() {
                debug!("profile update already in flight");
                return;
            }
            state.update_request.begin()
        };
        self.inner.notifier.notify();

        let body = serde_json::to_value(&patch).unwrap_or(serde_json::Value::Null);
        let result = self
            .inner
            .transport
            .request(Method::Put, endpoints::PROFILE, Some(body))
            .await;

        let toast_error = {
            let mut state = self.lock();
            match result.map(normalize::unwrap_data) {
                Ok(confirmed) => {
                    if state.update_request.succeed(token) {
                        if let Some(user) = state.user.as_mut() {
                            user.merge_from(&confirmed);
                        }
                    }
                    None
                }
                Err(e) => {
                    let message = e.user_message();
                    if state.update_request.fail(token, message.clone()) {
                        warn!(error = %e, "profile update failed");
                        Some(message)
                    } else {
                        None
                    }
                }
            }
        };
        if let Some(message) = toast_error {
            self.inner.notices.show(message, ToastKind::Error);
        }
        self.inner.notifier.notify();
    }

    /// Current session state.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        let state = self.lock();
        AuthSnapshot {
            phase: state.phase,
            user: state.user.clone(),
            send_request: state.send_request.clone(),
            verify_request: state.verify_request.clone(),
            profile_request: state.profile_request.clone(),
            update_request: state.update_request.clone(),
        }
    }
}

/// 10 to 15 digits, optionally prefixed with `+`.
fn valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

/// 4 to 6 digits.
fn valid_code(code: &str) -> bool {
    (4..=6).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}
