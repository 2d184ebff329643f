use crate::config::ScanConfig;
use crate::modules::WidgetSimpleList;
use crate::orchestrator::Orchestrator;
use crate::session::Bootstrapper;
use crate::sink::ResultSink;
use crate::tables;

use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::path::Path;

/// Gather target hosts. `--url` wins over `--file` when both are given.
///
/// Blank lines and `#` comments in the file are skipped and duplicates dropped.
pub fn collect_hosts(url: Option<&str>, file: Option<&Path>) -> Result<Vec<String>> {
    let lines: Vec<String> = match (url, file) {
        (Some(url), file) => {
            if let Some(file) = file {
                log::warn!("--url given, ignoring hosts in {}", file.display());
            }
            vec![url.to_string()]
        }
        (None, Some(file)) => std::fs::read_to_string(file)
            .with_context(|| format!("Error reading file {}", file.display()))?
            .lines()
            .map(str::to_string)
            .collect(),
        (None, None) => bail!("Either --url or --file must be specified."),
    };

    let mut seen = HashSet::new();
    let hosts = lines
        .into_iter()
        .map(|line| line.trim().trim_end_matches('/').to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(line.clone()))
        .collect();

    Ok(hosts)
}

/// Scan every target host for exposed list widgets.
///
/// Returns whether any probe found leaked records.
pub fn scan(
    url: Option<&str>,
    file: Option<&Path>,
    table_list: &Path,
    config: ScanConfig,
) -> Result<bool> {
    let tables = tables::load(table_list)?;
    let hosts = collect_hosts(url, file)?;

    if hosts.is_empty() {
        log::warn!("No target hosts to scan");
    }

    // Build the shared probe client up front so a bad proxy fails the run
    let http_client = config
        .client
        .client()
        .context("Failed to build HTTP client")?;

    let probe = WidgetSimpleList::new(
        http_client,
        ResultSink::new(&config.output_dir),
        config.fast_check,
    );
    let orchestrator = Orchestrator::new(Bootstrapper::new(config.client.clone()), probe, &config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    let report = runtime.block_on(orchestrator.run(&hosts, &tables));

    for finding in report.findings() {
        println!(
            "[{}] {}: {} records leaked",
            finding.host, finding.table, finding.records
        );
    }

    log::info!(
        "{} probes across {} hosts, {} hosts skipped",
        report.jobs_dispatched,
        report.hosts_bootstrapped,
        report.hosts_requested - report.hosts_bootstrapped
    );

    println!("{}", report.summary());
    println!("Scan completed in {} seconds", report.elapsed.as_secs_f32());

    Ok(report.vulnerable())
}
