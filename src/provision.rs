//! One-shot room provisioning over HTTP.
//!
//! Provisioning is a stateless request/response channel, separate from the
//! live session connection:
//!
//! - `POST {base}/api/create-room` → `200`, body is the new room code as
//!   plain text
//! - `POST {base}/api/join-room/{code}` → `200` on success, non-2xx when the
//!   room is missing or full
//!
//! A successful [`join_room`](ProvisioningClient::join_room) **must** precede
//! opening the session socket: it registers the participant's intent to join
//! so the server can correlate the upcoming socket handshake with a valid
//! room. There is no retry built in and no partial state retained on
//! failure — the caller decides whether to surface an error or try again.
//!
//! # Feature gate
//!
//! This module is only available when the `provisioning` feature is enabled
//! (it is enabled by default).

use crate::error::{BrainlookError, Result};

/// Client for the room provisioning endpoints.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() -> Result<(), brainlook_client::BrainlookError> {
/// use brainlook_client::ProvisioningClient;
///
/// let provisioner = ProvisioningClient::new("http://localhost:8080");
/// let room_code = provisioner.create_room().await?;
/// provisioner.join_room(&room_code).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProvisioningClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProvisioningClient {
    /// Create a provisioning client for the given HTTP base URL
    /// (e.g. `http://localhost:8080`). A trailing slash is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a provisioning client with a caller-supplied [`reqwest::Client`]
    /// (custom TLS, proxy, timeouts, …).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Create a new room and return its server-generated code.
    ///
    /// The code is opaque to the client; it is used verbatim in both the
    /// join-room URL and the socket URL.
    ///
    /// # Errors
    ///
    /// [`BrainlookError::Provisioning`] on a non-success status,
    /// [`BrainlookError::Http`] if the request itself fails.
    pub async fn create_room(&self) -> Result<String> {
        let url = format!("{}/api/create-room", self.base_url);
        tracing::debug!(%url, "creating room");

        let response = self.http.post(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BrainlookError::Provisioning {
                status: status.as_u16(),
                body,
            });
        }

        let room_code = body.trim().to_string();
        tracing::info!(%room_code, "room created");
        Ok(room_code)
    }

    /// Register intent to join `room_code`.
    ///
    /// Must complete successfully before the session socket is opened.
    ///
    /// # Errors
    ///
    /// [`BrainlookError::Provisioning`] on a non-success status (room missing
    /// or full), [`BrainlookError::Http`] if the request itself fails.
    pub async fn join_room(&self, room_code: &str) -> Result<()> {
        let url = format!("{}/api/join-room/{room_code}", self.base_url);
        tracing::debug!(%url, "joining room");

        let response = self.http.post(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrainlookError::Provisioning {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(%room_code, "join registered");
        Ok(())
    }

    /// The base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provisioner = ProvisioningClient::new("http://localhost:8080/");
        assert_eq!(provisioner.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        // TEST-NET-1 address, nothing listens there.
        let provisioner = ProvisioningClient::new("http://127.0.0.1:1");
        let err = provisioner.create_room().await.unwrap_err();
        assert!(matches!(err, BrainlookError::Http(_)));
    }
}
