// ABOUTME: The Client handle that owns the injected fetch collaborator and parses documents.
// ABOUTME: Schemas use it for lookups; records keep a clone to fetch followed links lazily.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use scraper::Html;

use crate::dom::parse_document;
use crate::error::Result;
use crate::options::{ClientBuilder, Options};
use crate::resource::{decode_body, FetchOptions, Fetcher, HttpFetcher};

/// Where a document comes from.
///
/// Strings and bytes are markup; use [`Source::url`] to fetch instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Html(String),
    Bytes(Vec<u8>),
    Url(String),
}

impl Source {
    pub fn url(url: impl Into<String>) -> Self {
        Source::Url(url.into())
    }
}

impl From<&str> for Source {
    fn from(html: &str) -> Self {
        Source::Html(html.to_string())
    }
}

impl From<String> for Source {
    fn from(html: String) -> Self {
        Source::Html(html)
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Source::Bytes(bytes)
    }
}

impl From<&[u8]> for Source {
    fn from(bytes: &[u8]) -> Self {
        Source::Bytes(bytes.to_vec())
    }
}

/// Cheap-to-clone handle to the fetch collaborator.
#[derive(Clone)]
pub struct Client {
    fetcher: Arc<dyn Fetcher>,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    ///
    /// Without a custom fetcher an [`HttpFetcher`] is built from the options.
    pub fn new(opts: Options) -> Self {
        let fetcher = opts.fetcher.clone().unwrap_or_else(|| {
            let http = HttpFetcher::new(&opts.user_agent, opts.timeout, opts.headers.clone())
                .expect("failed to build HTTP client");
            Arc::new(http)
        });
        Self { fetcher }
    }

    /// A client using `fetcher` for every document.
    pub fn with_fetcher(fetcher: impl Fetcher + 'static) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }

    /// Fetch a URL through the collaborator. Failures propagate unchanged.
    pub fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String> {
        self.fetcher.fetch(url, options)
    }

    /// Fetch and parse a URL into a fresh document.
    pub fn load(&self, url: &str, options: &FetchOptions) -> Result<Rc<Html>> {
        let body = self.fetch(url, options)?;
        Ok(parse_document(&body))
    }

    /// Parse any source into a fresh document; URLs are fetched with `options`.
    pub fn parse(&self, source: Source, options: &FetchOptions) -> Result<Rc<Html>> {
        match source {
            Source::Html(html) => Ok(parse_document(&html)),
            Source::Bytes(bytes) => Ok(parse_document(&decode_body(&bytes, None))),
            Source::Url(url) => self.load(&url, options),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}
