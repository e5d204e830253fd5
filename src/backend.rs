use std::future::Future;

use crate::error::Error;
use crate::types::{AuthPayload, LoginRequest, RegisterPayload, RegisterRequest, User};

/// The token/session backend the session core talks to.
///
/// One method per backend exchange; payload field names are part of the
/// compatibility contract (see the DTOs in [`crate::types`]).
/// [`ApiClient`](crate::api::ApiClient) is the production implementation;
/// tests supply mocks, which is also how `SessionController` stays
/// constructible per test case instead of leaning on process globals.
pub trait AuthBackend: Send + Sync + 'static {
    /// Exchange credentials for a user snapshot and token bundle.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthPayload, Error>> + Send;

    /// Create an account. Tokens are absent when email verification is
    /// required before first login.
    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<RegisterPayload, Error>> + Send;

    /// Obtain the Microsoft authorization URL to navigate the user to.
    fn microsoft_auth_url(&self) -> impl Future<Output = Result<String, Error>> + Send;

    /// Complete the Microsoft OAuth flow with the callback code and
    /// anti-CSRF state.
    fn microsoft_callback(
        &self,
        code: &str,
        state: &str,
    ) -> impl Future<Output = Result<AuthPayload, Error>> + Send;

    /// Mint a new access token from a refresh token.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    /// Invalidate the refresh token server-side.
    fn logout(&self, refresh_token: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Confirm an email-verification token; returns the updated user.
    fn verify_email(&self, token: &str) -> impl Future<Output = Result<User, Error>> + Send;

    /// Re-send the verification email.
    fn resend_verification_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Start the password-reset flow.
    fn forgot_password(&self, email: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Complete the password-reset flow.
    fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Server-side token verification (debug/health surface).
    fn verify_token(&self, token: &str) -> impl Future<Output = Result<bool, Error>> + Send;
}
