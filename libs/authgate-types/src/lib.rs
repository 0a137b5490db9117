//! Shared types and the password obfuscation codec for authgate.
//!
//! This crate provides:
//! - Session claims as decoded from the identity provider's ID token
//! - The normalized `AuthResult` identity handed to protected handlers
//! - Request/response bodies of the `/api/auth/*` routes
//! - Error codes shared by the server and the client SDK
//! - The XOR obfuscation codec used by the password-change exchange

mod auth_result;
mod claims;
pub mod codec;
mod errors;
mod responses;

pub use auth_result::{AuthResult, UserInfo};
pub use claims::SessionClaims;
pub use codec::{decode, encode, generate_key};
pub use errors::{CodecError, ErrorCode};
pub use responses::{
    ChangePasswordRequest, ChangePasswordResponse, EncryptionKeyResponse, ErrorResponse,
    RefreshResponse, StatusResponse,
};

/// Minimum length, in characters, of a new password.
pub const MIN_PASSWORD_LENGTH: usize = 8;
