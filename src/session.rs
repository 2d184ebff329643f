use crate::config::ClientSettings;
use crate::error::{Result, ScanError};
use crate::target::Host;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::cookie::{CookieStore, Jar};
use std::sync::Arc;

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"var g_ck = '([a-zA-Z0-9]+)'").expect("Failed to compile token pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Token and cookies harvested from an anonymous page load.
///
/// Built once per host and shared read-only by every probe of that host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredential {
    token: String,
    cookies: Vec<Cookie>,
}

impl SessionCredential {
    pub fn new(token: impl Into<String>, mut cookies: Vec<Cookie>) -> Self {
        cookies.sort_by(|a, b| a.name.cmp(&b.name));
        SessionCredential {
            token: token.into(),
            cookies,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Value for a `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn extract_token(body: &str) -> Option<&str> {
    TOKEN_PATTERN
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
}

fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some(Cookie {
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Performs the anonymous page load that yields a host's session.
pub struct Bootstrapper {
    settings: ClientSettings,
}

impl Bootstrapper {
    pub fn new(settings: ClientSettings) -> Self {
        Bootstrapper { settings }
    }

    pub async fn bootstrap(&self, host: &Host) -> Result<SessionCredential> {
        // Fresh jar per host so sessions never bleed across targets
        let jar = Arc::new(Jar::default());
        let client = self
            .settings
            .builder()?
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        let resp = client.get(host.url().clone()).send().await?;
        let final_url = resp.url().clone();
        let body = resp.text().await?;

        let token = extract_token(&body).ok_or_else(|| ScanError::TokenNotFound {
            host: host.to_string(),
        })?;

        let cookies = jar
            .cookies(&final_url)
            .and_then(|header| header.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default();

        let session = SessionCredential::new(token, cookies);

        println!("X-UserToken: {}", session.token());
        println!("Cookie: {}\n", session.cookie_header());

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_extract_token_should_capture_alphanumeric_value() {
        let body = "<script>var g_ck = 'abc123DEF';</script>";
        assert_eq!(extract_token(body), Some("abc123DEF"));
        assert_eq!(extract_token("var g_ck = '';"), None);
        assert_eq!(extract_token("var g_ck = 'abc-123';"), None);
    }

    #[test]
    fn test_cookie_header_should_be_sorted_by_name() {
        let session = SessionCredential::new(
            "T1",
            parse_cookie_header("glide_user_route=x; BIGipServerpool=y; JSESSIONID=z"),
        );
        assert_eq!(
            session.cookie_header(),
            "BIGipServerpool=y; JSESSIONID=z; glide_user_route=x"
        );
    }

    #[tokio::test]
    async fn test_bootstrap_should_return_token_and_cookies() {
        let mock_server = MockServer::start_async().await;

        mock_server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("Set-Cookie", "JSESSIONID=abc; Path=/")
                    .body("<html><script>var g_ck = 'T1';</script></html>");
            })
            .await;

        let host = Host::parse(&mock_server.base_url()).unwrap();
        let session = Bootstrapper::new(ClientSettings::accepting_invalid_certs())
            .bootstrap(&host)
            .await
            .unwrap();

        assert_eq!(session.token(), "T1");
        assert_eq!(session.cookie_header(), "JSESSIONID=abc");
    }

    #[tokio::test]
    async fn test_bootstrap_should_fail_when_token_missing() {
        let mock_server = MockServer::start_async().await;

        mock_server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body("<html><body>Login</body></html>");
            })
            .await;

        let host = Host::parse(&mock_server.base_url()).unwrap();
        let result = Bootstrapper::new(ClientSettings::accepting_invalid_certs())
            .bootstrap(&host)
            .await;

        assert!(matches!(result, Err(ScanError::TokenNotFound { .. })));
    }
}
