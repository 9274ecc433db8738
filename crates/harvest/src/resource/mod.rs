// ABOUTME: Fetch collaborator: the Fetcher trait plus the default blocking HTTP/file implementation.
// ABOUTME: Handles content-length limits, status checks, schema fetch options and charset decoding.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{HarvestError, Result};

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Opaque per-schema options forwarded verbatim to the fetcher.
pub type FetchOptions = BTreeMap<String, String>;

/// Fetch options `HttpFetcher` interprets itself instead of sending as headers.
pub const METHOD_OPTION: &str = "method";
pub const DATA_OPTION: &str = "data";
pub const ENCODING_OPTION: &str = "encoding";

/// Turns a URL into document text. Injected into a `Client`.
///
/// Implementations own transport concerns entirely: timeouts, retries and
/// caching belong here, never in record resolution.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String>;
}

impl<F> Fetcher for F
where
    F: Fn(&str, &FetchOptions) -> Result<String> + Send + Sync,
{
    fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String> {
        self(url, options)
    }
}

/// Blocking fetcher for `http(s)://` and `file://` URLs.
///
/// Fetch options `method` (GET or POST), `data` (request body) and `encoding`
/// (charset label overriding the response header) are interpreted; every
/// other option is sent as a request header.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    headers: BTreeMap<String, String>,
}

impl HttpFetcher {
    /// Build a fetcher with its own HTTP client.
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        headers: BTreeMap<String, String>,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| {
                HarvestError::fetch("", "Client", Some(anyhow::anyhow!("build failed: {}", e)))
            })?;
        Ok(Self {
            headers,
            ..Self::with_client(client)
        })
    }

    /// Wrap an existing HTTP client.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            headers: BTreeMap::new(),
        }
    }

    fn fetch_http(&self, url: &str, options: &FetchOptions) -> Result<String> {
        let method = options
            .get(METHOD_OPTION)
            .map(|m| m.to_uppercase())
            .unwrap_or_else(|| "GET".to_string());
        let mut request = match method.as_str() {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            other => {
                return Err(HarvestError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("unsupported method {}", other)),
                ))
            }
        };

        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        for (key, value) in options {
            if is_transport_option(key) {
                continue;
            }
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(data) = options.get(DATA_OPTION) {
            request = request.body(data.clone());
        }

        let response = request.send().map_err(|e| {
            HarvestError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
        })?;

        if let Some(len) = response.content_length() {
            if len > MAX_CONTENT_LENGTH as u64 {
                return Err(HarvestError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("content too large")),
                ));
            }
        }

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response.bytes().map_err(|e| {
            HarvestError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        })?;

        if body.len() > MAX_CONTENT_LENGTH {
            return Err(HarvestError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }

        if status != 200 {
            return Err(HarvestError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("HTTP status {}", status)),
            ));
        }

        let charset = options
            .get(ENCODING_OPTION)
            .map(String::as_str)
            .or_else(|| content_type.as_deref().and_then(extract_charset));
        Ok(decode_body(&body, charset))
    }

    fn fetch_file(&self, url: &url::Url, options: &FetchOptions) -> Result<String> {
        let path = url.to_file_path().map_err(|_| {
            HarvestError::invalid_url(
                url.as_str(),
                "Fetch",
                Some(anyhow::anyhow!("not a local file path")),
            )
        })?;
        let body = std::fs::read(&path).map_err(|e| {
            HarvestError::fetch(
                url.as_str(),
                "Fetch",
                Some(anyhow::anyhow!("failed to read {}: {}", path.display(), e)),
            )
        })?;
        let charset = options.get(ENCODING_OPTION).map(String::as_str);
        Ok(decode_body(&body, charset))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String> {
        if url.is_empty() {
            return Err(HarvestError::invalid_url(url, "Fetch", None));
        }

        let parsed = url::Url::parse(url).map_err(|e| {
            HarvestError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;

        tracing::debug!(url = %url, options = options.len(), "fetching document");

        match parsed.scheme() {
            "http" | "https" => self.fetch_http(url, options),
            "file" => self.fetch_file(&parsed, options),
            _ => Err(HarvestError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("scheme must be http, https or file")),
            )),
        }
    }
}

fn is_transport_option(key: &str) -> bool {
    matches!(key, METHOD_OPTION | DATA_OPTION | ENCODING_OPTION)
}

/// Decode body bytes to a String using the given charset label or detection.
pub fn decode_body(body: &[u8], charset: Option<&str>) -> String {
    if let Some(label) = charset {
        if let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes()) {
            let (decoded, _, _) = encoding.decode(body);
            return decoded.into_owned();
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from a Content-Type header.
fn extract_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|c| c.trim_matches('"').trim_matches('\''))
    })
}
