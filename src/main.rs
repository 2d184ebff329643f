mod action;
mod config;
mod error;
mod modules;
mod orchestrator;
mod session;
mod sink;
mod tables;
mod target;

use crate::config::{ClientSettings, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, ScanConfig};
use anyhow::{Result, bail};
use clap::Parser;
use env_logger::Env;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

/// Probe hosts for public list widgets that leak table records
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[arg(long, help = "The URL to fetch from")]
    url: Option<String>,

    #[arg(long, help = "File of URLs, one per line (ignored when --url is given)")]
    file: Option<PathBuf>,

    #[arg(long, help = "Only check the kb_knowledge table")]
    fast_check: bool,

    #[arg(long, help = "Proxy server in the format http://host:port")]
    proxy: Option<Url>,

    #[arg(long, default_value = "table_list.txt", help = "File of table names to probe")]
    tables: PathBuf,

    #[arg(long, default_value = "result", help = "Directory leaked records are written to")]
    output: PathBuf,

    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, help = "Probes in flight at once")]
    concurrency: usize,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, help = "Per-request timeout in seconds")]
    timeout: u64,

    #[arg(long, help = "Overall deadline for the probe phase in seconds")]
    deadline: Option<u64>,

    #[arg(long, help = "Accept invalid TLS certificates")]
    insecure: bool,

    #[arg(long, help = "Exit with status 2 when vulnerable URLs are found")]
    fail_on_findings: bool,
}

impl Cli {
    fn scan_config(&self) -> Result<ScanConfig> {
        if self.concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }

        Ok(ScanConfig {
            concurrency: self.concurrency,
            fast_check: self.fast_check,
            deadline: self.deadline.map(Duration::from_secs),
            output_dir: self.output.clone(),
            client: ClientSettings {
                proxy: self.proxy.clone(),
                timeout: Duration::from_secs(self.timeout),
                accept_invalid_certs: self.insecure,
            },
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let vulnerable = action::scan(
        cli.url.as_deref(),
        cli.file.as_deref(),
        &cli.tables,
        cli.scan_config()?,
    )?;

    if vulnerable && cli.fail_on_findings {
        std::process::exit(2);
    }

    Ok(())
}
