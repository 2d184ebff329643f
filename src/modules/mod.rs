mod widget_list;

pub use widget_list::WidgetSimpleList;

use crate::error::Result;
use crate::session::SessionCredential;
use crate::tables::TableCandidate;
use crate::target::Host;
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

pub trait Module {
    fn name(&self) -> String;
    fn description(&self) -> String;
}

/// Checks one table of one host for exposed records.
///
/// Returns the leaked records, or an empty list when nothing leaked. The
/// network exchange must finish before `deadline`, when one is given.
#[async_trait]
pub trait Probe: Module + Send + Sync {
    async fn probe(
        &self,
        host: &Host,
        session: &SessionCredential,
        table: &TableCandidate,
        deadline: Option<Instant>,
    ) -> Result<Vec<Value>>;
}
