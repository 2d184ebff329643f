//! Fan-out of probe jobs across hosts and tables.
//!
//! Every host is bootstrapped once, in input order. Each host that yields a
//! session contributes one job per table candidate; all jobs then share a
//! single admission window of `concurrency` slots. Every dispatched job
//! reports exactly one [`ProbeOutcome`], failed ones included, and the scan
//! verdict is the OR of those outcomes.

use crate::config::ScanConfig;
use crate::modules::{Module, Probe};
use crate::session::{Bootstrapper, SessionCredential};
use crate::tables::TableCandidate;
use crate::target::Host;

use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One (host, table) unit of work.
#[derive(Debug, Clone)]
pub struct ProbeJob {
    pub host: Arc<Host>,
    pub session: Arc<SessionCredential>,
    pub table: TableCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub host: String,
    pub table: TableCandidate,
    pub vulnerable: bool,
    pub records: usize,
}

#[derive(Debug)]
pub struct ScanReport {
    pub hosts_requested: usize,
    pub hosts_bootstrapped: usize,
    pub jobs_dispatched: usize,
    pub outcomes: Vec<ProbeOutcome>,
    pub elapsed: Duration,
}

impl ScanReport {
    pub fn vulnerable(&self) -> bool {
        verdict(&self.outcomes)
    }

    pub fn findings(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.vulnerable)
    }

    pub fn summary(&self) -> &'static str {
        if self.vulnerable() {
            "Scanning completed. Vulnerable URLs found."
        } else {
            "Scanning completed. No vulnerable URLs found."
        }
    }
}

pub fn verdict(outcomes: &[ProbeOutcome]) -> bool {
    outcomes.iter().any(|outcome| outcome.vulnerable)
}

/// Expand bootstrapped hosts into the full host × table job list.
pub fn plan(
    sessions: &[(Arc<Host>, Arc<SessionCredential>)],
    tables: &[TableCandidate],
) -> Vec<ProbeJob> {
    let mut jobs = Vec::with_capacity(sessions.len() * tables.len());

    for (host, session) in sessions {
        jobs.extend(tables.iter().map(|table| ProbeJob {
            host: Arc::clone(host),
            session: Arc::clone(session),
            table: table.clone(),
        }));
    }

    jobs
}

pub struct Orchestrator<P> {
    bootstrapper: Bootstrapper,
    probe: P,
    concurrency: usize,
    deadline: Option<Duration>,
}

impl<P: Probe> Orchestrator<P> {
    pub fn new(bootstrapper: Bootstrapper, probe: P, config: &ScanConfig) -> Self {
        Orchestrator {
            bootstrapper,
            probe,
            concurrency: config.concurrency.max(1),
            deadline: config.deadline,
        }
    }

    pub async fn run(&self, hosts: &[String], tables: &[TableCandidate]) -> ScanReport {
        let scan_start = std::time::Instant::now();

        log::info!(
            "Starting {} ({}) on {} hosts with {} table candidates",
            self.probe.name(),
            self.probe.description(),
            hosts.len(),
            tables.len()
        );

        let sessions = self.bootstrap_hosts(hosts).await;
        let jobs = plan(&sessions, tables);
        let jobs_dispatched = jobs.len();

        log::info!(
            "{} of {} hosts bootstrapped, dispatching {} probes",
            sessions.len(),
            hosts.len(),
            jobs_dispatched
        );

        let outcomes = self.dispatch(jobs).await;

        ScanReport {
            hosts_requested: hosts.len(),
            hosts_bootstrapped: sessions.len(),
            jobs_dispatched,
            outcomes,
            elapsed: scan_start.elapsed(),
        }
    }

    /// Bootstrap each host in turn. Hosts that fail are logged and skipped.
    pub async fn bootstrap_hosts(
        &self,
        hosts: &[String],
    ) -> Vec<(Arc<Host>, Arc<SessionCredential>)> {
        let mut sessions = Vec::with_capacity(hosts.len());

        for input in hosts {
            let bootstrapped = match Host::parse(input) {
                Ok(host) => self
                    .bootstrapper
                    .bootstrap(&host)
                    .await
                    .map(|session| (host, session)),
                Err(e) => Err(e),
            };

            match bootstrapped {
                Ok((host, session)) => sessions.push((Arc::new(host), Arc::new(session))),
                Err(e) => log::error!("Error fetching g_ck for {}: {}", input, e),
            }
        }

        sessions
    }

    /// Run every job under the shared admission window and collect one
    /// outcome per job.
    pub async fn dispatch(&self, jobs: Vec<ProbeJob>) -> Vec<ProbeOutcome> {
        let deadline = self.deadline.map(|deadline| Instant::now() + deadline);

        stream::iter(jobs)
            .map(|job| self.execute(job, deadline))
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }

    async fn execute(&self, job: ProbeJob, deadline: Option<Instant>) -> ProbeOutcome {
        let result = self
            .probe
            .probe(&job.host, &job.session, &job.table, deadline)
            .await;

        let records = match result {
            Ok(records) => records.len(),
            Err(e) => {
                log::error!(
                    "Error checking vulnerability for {} (table {}): {}",
                    job.host,
                    job.table,
                    e
                );
                0
            }
        };

        ProbeOutcome {
            host: job.host.to_string(),
            table: job.table,
            vulnerable: records > 0,
            records,
        }
    }
}
