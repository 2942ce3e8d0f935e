//! Production `HttpBackend` built on `reqwest`.
//!
//! This adapter only moves bytes.  It maps the request's body variant onto
//! reqwest's JSON or multipart encoders, sends it, and hands back the status
//! code and raw body.  Interpreting the status is `ApiClient`'s job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};

use crate::application::api::{
    ApiError, ApiRequest, FormPart, HttpBackend, HttpMethod, RawResponse, RequestBody,
};

pub struct ReqwestBackend {
    client: Client,
}

impl ReqwestBackend {
    /// Builds a backend whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn form(parts: Vec<(String, FormPart)>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for (name, part) in parts {
        form = match part {
            FormPart::Text(value) => form.text(name, value),
            FormPart::File {
                file_name,
                mime,
                bytes,
            } => {
                let mut part = Part::bytes(bytes).file_name(file_name);
                if let Some(mime) = mime {
                    part = part
                        .mime_str(&mime)
                        .map_err(|e| ApiError::Encode(format!("invalid MIME type {mime:?}: {e}")))?;
                }
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let mut builder = self.client.request(method(request.method), &request.url);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(parts) => builder.multipart(form(parts)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        assert_eq!(method(HttpMethod::Get), Method::GET);
        assert_eq!(method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(method(HttpMethod::Delete), Method::DELETE);
    }

    #[test]
    fn test_invalid_mime_is_encode_error() {
        let parts = vec![(
            "file".to_string(),
            FormPart::File {
                file_name: "x.bin".to_string(),
                mime: Some("not a mime".to_string()),
                bytes: vec![0],
            },
        )];
        assert!(matches!(form(parts), Err(ApiError::Encode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let backend = ReqwestBackend::new(Duration::from_secs(2)).unwrap();
        let result = backend
            .send(ApiRequest {
                method: HttpMethod::Get,
                url: "http://127.0.0.1:9/api/auth/hospitals".to_string(),
                bearer_token: None,
                body: RequestBody::Empty,
            })
            .await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
