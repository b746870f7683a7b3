//! Synchronous validation errors.
//!
//! Transport failures never reach store callers; they are folded into the
//! owning [`crate::request::RequestEnvelope`]. The only error a store
//! operation returns directly is a [`ValidationError`], raised before any
//! network call is made.

use thiserror::Error;

/// Input rejected locally, before any network traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Phone number is not 10-15 digits (optionally `+`-prefixed).
    #[error("invalid phone number")]
    InvalidPhone,

    /// OTP code is not 4-6 digits.
    #[error("invalid OTP code")]
    InvalidOtpCode,

    /// `verify_otp` was called while no OTP request is pending.
    #[error("no OTP has been requested")]
    OtpNotRequested,

    /// Checkout was attempted with no items.
    #[error("cart is empty")]
    EmptyCart,

    /// Checkout was attempted without a delivery address.
    #[error("missing delivery address")]
    MissingAddress,
}
