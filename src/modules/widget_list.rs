use crate::error::{Result, ScanError};
use crate::modules::{Module, Probe};
use crate::session::SessionCredential;
use crate::sink::ResultSink;
use crate::tables::TableCandidate;
use crate::target::Host;
use async_trait::async_trait;

use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::Instant;

const WIDGET_ENDPOINT: &str = "/api/now/sp/widget/widget-simple-list";

#[derive(Debug, PartialEq)]
enum Exposure {
    /// Endpoint answered but did not list the table.
    NotListed,
    /// Widget is public but the list came back empty, ACLs are filtering rows.
    Blocked,
    Leaking(Vec<Value>),
}

/// Reads `result.data.list` out of a widget response.
fn classify(url: &str, mut body: Value) -> Result<Exposure> {
    let malformed = |reason: &str| ScanError::MalformedResponse {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let result = body
        .get_mut("result")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| malformed("missing result object"))?;

    let data = result
        .get_mut("data")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| malformed("no data key in result"))?;

    match data.remove("list") {
        Some(Value::Array(list)) if list.is_empty() => Ok(Exposure::Blocked),
        Some(Value::Array(list)) => Ok(Exposure::Leaking(list)),
        _ => Ok(Exposure::NotListed),
    }
}

/// Probes the public `widget-simple-list` widget for table exposure.
pub struct WidgetSimpleList {
    http_client: Client,
    sink: ResultSink,
    fast_check: bool,
}

impl WidgetSimpleList {
    pub fn new(http_client: Client, sink: ResultSink, fast_check: bool) -> Self {
        WidgetSimpleList {
            http_client,
            sink,
            fast_check,
        }
    }
}

impl Module for WidgetSimpleList {
    fn name(&self) -> String {
        String::from("http/widget_simple_list")
    }

    fn description(&self) -> String {
        String::from("Check if public list widgets leak table records")
    }
}

impl WidgetSimpleList {
    /// POST to the widget and decode the JSON reply.
    async fn fetch(&self, url: &str, session: &SessionCredential) -> Result<Value> {
        let mut request = self
            .http_client
            .post(url)
            .header("X-UserToken", session.token())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body("{}");

        if !session.cookies().is_empty() {
            request = request.header(COOKIE, session.cookie_header());
        }

        let resp = request.send().await?;

        let status = resp.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(ScanError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.json::<Value>().await.map_err(|source| {
            if source.is_decode() {
                ScanError::Decode {
                    url: url.to_string(),
                    source,
                }
            } else {
                ScanError::Http(source)
            }
        })
    }
}

#[async_trait]
impl Probe for WidgetSimpleList {
    async fn probe(
        &self,
        host: &Host,
        session: &SessionCredential,
        table: &TableCandidate,
        deadline: Option<Instant>,
    ) -> Result<Vec<Value>> {
        if self.fast_check && !table.is_fast_check_table() {
            return Ok(Vec::new());
        }

        let url = host.endpoint(&format!("{}?{}", WIDGET_ENDPOINT, table.query()));

        // Only the network exchange is bounded; a leak that made it back is
        // always written out and reported.
        let body = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.fetch(&url, session))
                .await
                .unwrap_or(Err(ScanError::DeadlineExceeded))?,
            None => self.fetch(&url, session).await?,
        };

        match classify(&url, body)? {
            Exposure::NotListed => Ok(Vec::new()),
            Exposure::Blocked => {
                println!(
                    "{} is EXPOSED, but data is NOT leaking likely because ACLs are blocking. Mark Widgets as not Public.",
                    url
                );
                Ok(Vec::new())
            }
            Exposure::Leaking(records) => {
                println!("{} is EXPOSED, and LEAKING data. Check ACLs ASAP.", url);
                let path = self.sink.persist(host, table, &records).await?;
                log::info!("{} records from {} saved to {}", records.len(), url, path.display());
                Ok(records)
            }
        }
    }
}
