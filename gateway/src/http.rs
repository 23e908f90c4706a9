//! HTTP plumbing for the backend gateway.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    multipart, Client as ReqwestClient, Response,
};
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    types::ErrorBody,
};

const USER_AGENT_VALUE: &str = "voiceid-gateway-rust/1.0";

/// HTTP client for the recognition backend.
pub(crate) struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    max_retries: u32,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub(crate) fn new(base_url: String, timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            max_retries,
        })
    }

    /// Performs a GET request and decodes the JSON response.
    pub(crate) async fn get_json<R>(&self, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.with_retries(|| async move {
            let url = format!("{}{}", self.base_url, path);
            let response = self
                .client
                .get(&url)
                .headers(self.default_headers())
                .send()
                .await?;
            self.handle_response(response).await
        })
        .await
    }

    /// Uploads an audio payload plus form fields using multipart form data.
    ///
    /// The payload is passed as [`Bytes`] so each retry attempt can rebuild
    /// the form without copying the audio.
    pub(crate) async fn upload<R>(
        &self,
        path: &str,
        audio: Bytes,
        filename: &str,
        media_type: &str,
        fields: &[(&str, &str)],
    ) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.with_retries(|| {
            let audio = audio.clone();
            async move {
                let url = format!("{}{}", self.base_url, path);

                let part = multipart::Part::stream(audio)
                    .file_name(filename.to_string())
                    .mime_str(media_type)?;

                let mut form = multipart::Form::new().part("file", part);
                for (key, value) in fields {
                    form = form.text(key.to_string(), value.to_string());
                }

                let response = self
                    .client
                    .post(&url)
                    .headers(self.default_headers())
                    .multipart(form)
                    .send()
                    .await?;
                self.handle_response(response).await
            }
        })
        .await
    }

    /// Runs a request closure with retry support for retryable failures.
    async fn with_retries<F, Fut, R>(&self, mut attempt_fn: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ...
                let backoff = Duration::from_secs(1 << (attempt - 1));
                tracing::debug!(attempt, ?backoff, "retrying backend request");
                tokio::time::sleep(backoff).await;
            }

            match attempt_fn().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_retryable() {
                        last_err = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Other("max retries exceeded".to_string())))
    }

    /// Returns default headers for backend requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers
    }

    /// Handles the backend response.
    async fn handle_response<R>(&self, response: Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(parse_error(&body, status.as_u16()));
        }

        serde_json::from_slice(&body).map_err(Error::from)
    }
}

/// Parses an error response body into an [`Error::Api`].
fn parse_error(body: &[u8], http_status: u16) -> Error {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body)
        && let Some(message) = parsed.error.or(parsed.message)
    {
        return Error::api(message, http_status);
    }

    Error::api(String::from_utf8_lossy(body).to_string(), http_status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_prefers_error_field() {
        let err = parse_error(br#"{"error":"no model for name"}"#, 404);
        match err {
            Error::Api {
                message,
                http_status,
            } => {
                assert_eq!(message, "no model for name");
                assert_eq!(http_status, 404);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_error_falls_back_to_raw_body() {
        let err = parse_error(b"Internal Server Error", 500);
        assert!(err.is_server_error());
        assert!(err.to_string().contains("Internal Server Error"));
    }
}
