//! Outbound HTTP helper exposed to handlers.
//!
//! Handlers call external services through [`HttpClient::request`]; the
//! webhook pipeline itself never uses it.

use crate::{CloudError, CloudResult};
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
    Text(String),
}

/// Options for one outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequestOptions {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Query string parameters appended to `url`.
    pub params: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub follow_redirects: bool,
}

impl HttpRequestOptions {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body: None,
            follow_redirects: true,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(fields));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}

/// A buffered outbound response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased; repeated headers keep the last value.
    pub headers: HashMap<String, String>,
    pub text: String,
    /// The body parsed as JSON, when it parses.
    pub data: Option<Value>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared outbound client; cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    following: Client,
    direct: Client,
}

impl HttpClient {
    pub fn new() -> CloudResult<Self> {
        let following = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let direct = Client::builder()
            .timeout(Duration::from_secs(60))
            .redirect(Policy::none())
            .build()?;
        Ok(Self { following, direct })
    }

    /// Performs the request and buffers the response.
    ///
    /// Statuses outside 2xx come back as [`CloudError::HttpStatus`] carrying
    /// the response; a redirect is only an error when redirects are not followed.
    pub async fn request(&self, options: HttpRequestOptions) -> CloudResult<HttpResponse> {
        let client = if options.follow_redirects {
            &self.following
        } else {
            &self.direct
        };
        debug!(method = %options.method, url = %options.url, "outbound request");

        let mut builder = client.request(options.method, &options.url);
        if !options.params.is_empty() {
            builder = builder.query(&options.params);
        }
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match options.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Form(fields)) => builder.form(&fields),
            Some(RequestBody::Text(body)) => builder.body(body),
            None => builder,
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = resp.text().await?;
        let data = serde_json::from_str(&text).ok();

        let response = HttpResponse {
            status,
            headers,
            text,
            data,
        };
        if response.is_success() {
            Ok(response)
        } else {
            Err(CloudError::HttpStatus(Box::new(response)))
        }
    }
}
