use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// HTTP settings of the native event source.
///
/// Deserializable with every field optional, so it can be read from a JSON
/// settings file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeEventSourceConfig {
    pub user_agent: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub headers: BTreeMap<String, String>,
}

impl NativeEventSourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Send an extra header with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Configured headers, skipping the ones that are not valid HTTP.
    pub(crate) fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => log::warn!("Ignoring invalid header {}: {}", name, value),
            }
        }
        map
    }

    /// Build the HTTP client, with a cookie store for credentialed sources.
    pub(crate) fn build_client(&self, with_credentials: bool) -> reqwest::Client {
        let mut builder = reqwest::Client::builder()
            .default_headers(self.header_map())
            .cookie_store(with_credentials);
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if let Some(timeout) = self.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }

        builder.build().unwrap_or_else(|e| {
            log::error!("Failed to build HTTP client, using defaults: {}", e);
            reqwest::Client::new()
        })
    }
}
