use serde::Deserialize;
use url::Url;

use crate::backend::AuthBackend;
use crate::error::Error;
use crate::types::{
    AuthPayload, AuthUrlResponse, CallbackRequest, LoginRequest, LogoutRequest, RefreshRequest,
    RefreshResponse, RegisterPayload, RegisterRequest, User, VerifyEmailResponse,
    VerifyTokenRequest, VerifyTokenResponse,
};

/// Expro API configuration.
///
/// The required field is a constructor parameter — no runtime "missing
/// field" errors.
///
/// ```rust,ignore
/// use expro_auth::ApiConfig;
///
/// let config = ApiConfig::new("https://api.expro.example.com".parse()?);
/// // Optional overrides via chaining:
/// let config = config.with_auth_path("/api/v2/auth");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) auth_path: String,
}

impl ApiConfig {
    /// Create a new configuration for the given API origin.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            auth_path: "/api/auth".into(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Required env vars
    /// - `EXPRO_API_URL`: API origin (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `EXPRO_AUTH_PATH`: Override the auth route prefix (default `/api/auth`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if required env vars are missing or invalid.
    pub fn from_env() -> Result<Self, Error> {
        let base_url_str = std::env::var("EXPRO_API_URL")
            .map_err(|_| Error::Config("EXPRO_API_URL is required".into()))?;
        let base_url: Url = base_url_str
            .parse()
            .map_err(|e| Error::Config(format!("EXPRO_API_URL: {e}")))?;

        let mut config = Self::new(base_url);
        if let Ok(path) = std::env::var("EXPRO_AUTH_PATH") {
            config = config.with_auth_path(path);
        }
        Ok(config)
    }

    /// Override the auth route prefix (default `/api/auth`).
    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.auth_path = path.into();
        self
    }

    /// API origin.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// HTTP client for the Expro token/session backend.
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

/// Error body shape the backend uses for rejected exchanges.
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    fn endpoint(&self, route: &str) -> Url {
        // Keep any path component of the base URL (e.g. a reverse-proxy
        // prefix) in front of the auth routes.
        let path = format!(
            "{}/{}/{route}",
            self.config.base_url.path().trim_end_matches('/'),
            self.config.auth_path.trim_matches('/'),
        );
        let mut url = self.config.base_url.clone();
        url.set_path(&path);
        url
    }

    /// Checks HTTP response status; returns the response on success or an
    /// error carrying the server's message where one was returned.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.detail)
            .unwrap_or(body);
        Err(Error::Api {
            operation,
            status: Some(status),
            detail,
        })
    }

    async fn post_json<T, B>(
        &self,
        route: &str,
        body: &B,
        operation: &'static str,
    ) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let response = self.http.post(self.endpoint(route)).json(body).send().await?;
        let response = Self::ensure_success(response, operation).await?;
        response.json::<T>().await.map_err(Into::into)
    }
}

impl AuthBackend for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthPayload, Error> {
        self.post_json("login", request, "login").await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterPayload, Error> {
        self.post_json("register", request, "registration").await
    }

    async fn microsoft_auth_url(&self) -> Result<String, Error> {
        let response = self.http.get(self.endpoint("microsoft/url")).send().await?;
        let response = Self::ensure_success(response, "microsoft auth url").await?;
        let payload = response.json::<AuthUrlResponse>().await?;
        Ok(payload.auth_url)
    }

    async fn microsoft_callback(&self, code: &str, state: &str) -> Result<AuthPayload, Error> {
        let request = CallbackRequest {
            code: code.to_string(),
            state: state.to_string(),
        };
        self.post_json("microsoft/callback", &request, "microsoft callback")
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, Error> {
        let request = RefreshRequest {
            refresh: refresh_token.to_string(),
        };
        let payload: RefreshResponse = self.post_json("refresh", &request, "token refresh").await?;
        Ok(payload.access)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), Error> {
        let request = LogoutRequest {
            refresh: refresh_token.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint("logout"))
            .json(&request)
            .send()
            .await?;
        Self::ensure_success(response, "logout").await?;
        Ok(())
    }

    async fn verify_email(&self, token: &str) -> Result<User, Error> {
        // Token travels as a query parameter: the backend's verification
        // links point here directly.
        let mut url = self.endpoint("verify-email");
        url.query_pairs_mut().append_pair("token", token);
        let response = self.http.get(url).send().await?;
        let response = Self::ensure_success(response, "email verification").await?;
        let payload = response.json::<VerifyEmailResponse>().await?;
        Ok(payload.user)
    }

    async fn resend_verification_email(&self, email: &str) -> Result<(), Error> {
        let request = serde_json::json!({ "email": email });
        let response = self
            .http
            .post(self.endpoint("resend-verification"))
            .json(&request)
            .send()
            .await?;
        Self::ensure_success(response, "resend verification email").await?;
        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        let request = serde_json::json!({ "email": email });
        let response = self
            .http
            .post(self.endpoint("forgot-password"))
            .json(&request)
            .send()
            .await?;
        Self::ensure_success(response, "forgot password").await?;
        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), Error> {
        let request = serde_json::json!({ "token": token, "password": new_password });
        let response = self
            .http
            .post(self.endpoint("reset-password"))
            .json(&request)
            .send()
            .await?;
        Self::ensure_success(response, "password reset").await?;
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<bool, Error> {
        let request = VerifyTokenRequest {
            token: token.to_string(),
        };
        let payload: VerifyTokenResponse =
            self.post_json("verify-token", &request, "token verification").await?;
        Ok(payload.valid)
    }
}
