// ABOUTME: Configuration for Harvest: client Options with a fluent ClientBuilder, and SchemaOptions.
// ABOUTME: SchemaOptions separates reserved keys (selector, base_url) from pass-through fetch options.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::client::Client;
use crate::resource::{FetchOptions, Fetcher};

/// Root selector used when a schema does not declare one.
pub const DEFAULT_SELECTOR: &str = "html";

/// Option keys with meaning to the schema itself; never forwarded to the fetcher.
pub const RESERVED_OPTIONS: [&str; 2] = ["selector", "base_url"];

/// Option keys starting with this prefix are private and never forwarded.
pub const PRIVATE_OPTION_PREFIX: &str = "_";

/// Resolved options of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    pub selector: String,
    pub base_url: String,
    pub fetch_options: FetchOptions,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
            base_url: String::new(),
            fetch_options: FetchOptions::new(),
        }
    }
}

impl SchemaOptions {
    /// Build options from an open key/value block.
    ///
    /// `selector` and `base_url` are picked out, private keys are dropped and
    /// everything else becomes a fetch option.
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut opts = Self::default();
        for (key, value) in entries {
            let key = key.into();
            if key == "selector" {
                opts.selector = value.into();
            } else if key == "base_url" {
                opts.base_url = value.into();
            } else if is_forwardable(&key) {
                opts.fetch_options.insert(key, value.into());
            }
        }
        opts
    }
}

/// Whether an option key may reach the fetch collaborator.
pub fn is_forwardable(key: &str) -> bool {
    !RESERVED_OPTIONS.contains(&key) && !key.starts_with(PRIVATE_OPTION_PREFIX)
}

/// Configuration options for the Harvest client.
#[derive(Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: BTreeMap<String, String>,
    pub fetcher: Option<Arc<dyn Fetcher>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "Harvest/1.0".to_string(),
            headers: BTreeMap::new(),
            fetcher: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .field("fetcher", &self.fetcher.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the request timeout of the default HTTP fetcher.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header of the default HTTP fetcher.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request of the default HTTP fetcher.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the default HTTP fetcher.
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.opts.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = SchemaOptions::default();
        assert_eq!(opts.selector, "html");
        assert_eq!(opts.base_url, "");
        assert!(opts.fetch_options.is_empty());
    }

    #[test]
    fn from_map_splits_reserved_and_forwarded_keys() {
        let opts = SchemaOptions::from_map([
            ("selector", "p.p_with_link"),
            ("base_url", "http://localhost"),
            ("extra_attribute", "value"),
            ("_private", "hidden"),
        ]);
        assert_eq!(opts.selector, "p.p_with_link");
        assert_eq!(opts.base_url, "http://localhost");
        assert_eq!(opts.fetch_options.len(), 1);
        assert_eq!(
            opts.fetch_options.get("extra_attribute").map(String::as_str),
            Some("value")
        );
    }

    #[test]
    fn forwardable_keys() {
        assert!(is_forwardable("accept-language"));
        assert!(!is_forwardable("selector"));
        assert!(!is_forwardable("base_url"));
        assert!(!is_forwardable("_cache"));
    }
}
