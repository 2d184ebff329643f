use crate::error::Result;
use crate::sink::DEFAULT_RESULT_DIR;
use reqwest::{Client, ClientBuilder, Proxy, Url};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Transport settings shared by the bootstrap and probe clients.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub proxy: Option<Url>,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl ClientSettings {
    pub fn builder(&self) -> Result<ClientBuilder> {
        let builder = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs);

        // Without an explicit proxy, ignore HTTP_PROXY and friends
        let builder = match &self.proxy {
            Some(proxy) => builder.proxy(Proxy::all(proxy.clone())?),
            None => builder.no_proxy(),
        };

        Ok(builder)
    }

    pub fn client(&self) -> Result<Client> {
        Ok(self.builder()?.build()?)
    }

    /// Settings for local mock servers, which present self-signed certificates.
    #[cfg(test)]
    pub fn accepting_invalid_certs() -> Self {
        ClientSettings {
            accept_invalid_certs: true,
            ..ClientSettings::default()
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            proxy: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Probes in flight at once, across all hosts.
    pub concurrency: usize,
    pub fast_check: bool,
    /// Overall scan deadline, measured from the start of the probe phase.
    pub deadline: Option<Duration>,
    pub output_dir: PathBuf,
    pub client: ClientSettings,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            concurrency: DEFAULT_CONCURRENCY,
            fast_check: false,
            deadline: None,
            output_dir: PathBuf::from(DEFAULT_RESULT_DIR),
            client: ClientSettings::default(),
        }
    }
}
