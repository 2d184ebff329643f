use crate::error::{Result, ScanError};
use reqwest::Url;
use std::fmt;

/// A target instance, identified by its base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    base: String,
    url: Url,
}

impl Host {
    /// Parse a base address such as `https://acme.service-now.com`.
    ///
    /// Only `http` and `https` addresses with a host name are accepted. A
    /// trailing `/` is dropped so that endpoint paths can be appended.
    pub fn parse(input: &str) -> Result<Self> {
        let base = input.trim().trim_end_matches('/');

        let invalid = |reason: &str| ScanError::InvalidHost {
            host: input.trim().to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host name"));
        }

        Ok(Host {
            base: base.to_string(),
            url,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Leading DNS label of the host name (`https://acme.example.com` -> `acme`).
    pub fn label(&self) -> &str {
        let hostname = self.url.host_str().unwrap_or_default();
        hostname.split('.').next().unwrap_or(hostname)
    }

    pub fn endpoint(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base, path_and_query)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}
