// One-shot pipeline steps. The binary runs one mode to completion and exits;
// an external scheduler provides the loop.

use crate::config::AppConfig;
use crate::hosts;
use crate::models::{Cdn, Resolution, Sample, now_timestamp};
use crate::report;
use crate::resolver::DomainResolver;
use crate::sampler::Sampler;
use crate::stats_repo::{StatsRepo, summary};
use rand::Rng;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{info, warn};

/// How many historically fastest IPs join the per-CDN random picks.
const TOP_IP_COUNT: u32 = 3;

/// VACUUM once per this many retention passes, on average.
const VACUUM_ODDS: u32 = 100;

pub struct Probe {
    repo: StatsRepo,
    config: AppConfig,
}

impl Probe {
    pub fn new(repo: StatsRepo, config: AppConfig) -> Self {
        Self { repo, config }
    }

    /// DNS-check mode: resolve the domain once, classify the route, record it.
    pub async fn check_dns(&self) -> anyhow::Result<()> {
        let resolver = DomainResolver::from_system_conf(self.config.sampler.dns_timeout())?;
        let route = resolver
            .resolve(&self.config.options.download_domain)
            .await?;
        let record = Resolution {
            timestamp: now_timestamp(),
            cdn: route.cdn.to_string(),
            ip: route.ip.to_string(),
        };
        self.repo.record_resolution(&record).await?;
        info!(cdn = %route.cdn, ip = %route.ip, "route recorded");
        Ok(())
    }

    /// One random previously-seen IP per known CDN (bootstrap gaps skipped)
    /// plus the historically fastest IPs from the previous report pass.
    async fn sample_targets(&self) -> anyhow::Result<Vec<(String, String)>> {
        let mut targets: Vec<(String, String)> = Vec::new();
        for cdn in Cdn::KNOWN {
            match self.repo.random_ip_for(cdn.as_str()).await? {
                Some(ip) => targets.push((cdn.as_str().to_string(), ip)),
                None => info!(cdn = %cdn, "no IP resolved yet, checking next CDN provider"),
            }
        }
        targets.extend(self.repo.top_ips(TOP_IP_COUNT).await?);
        Ok(targets)
    }

    /// Download from each target in sequence, recording one sample row per
    /// measurable transfer. Failed transfers are dropped with a warning.
    /// All samples of a run share one timestamp.
    pub async fn run_downloads(&self) -> anyhow::Result<u32> {
        let opts = &self.config.options;
        let sampler = Sampler::new(
            &opts.download_domain,
            &opts.download_path,
            opts.download_size,
            self.config.sampler.request_timeout(),
        );

        let timestamp = now_timestamp();
        let targets = self.sample_targets().await?;
        let mut written: u32 = 0;

        for (i, (cdn, ip)) in targets.iter().enumerate() {
            let addr: Ipv4Addr = match ip.parse() {
                Ok(a) => a,
                Err(e) => {
                    warn!(error = %e, cdn = %cdn, ip = %ip, "stored IP not parseable, skipping");
                    continue;
                }
            };
            match sampler.sample(addr).await {
                Ok(bandwidth) => {
                    self.repo
                        .record_sample(&Sample {
                            timestamp: timestamp.clone(),
                            cdn: cdn.clone(),
                            ip: ip.clone(),
                            bandwidth,
                        })
                        .await?;
                    info!(cdn = %cdn, ip = %ip, bandwidth, "sample recorded");
                    written += 1;
                }
                Err(e) => {
                    warn!(error = %e, cdn = %cdn, ip = %ip, "download failed, sample dropped");
                }
            }
            if i + 1 < targets.len() {
                tokio::time::sleep(self.config.sampler.pause()).await;
            }
        }

        Ok(written)
    }

    /// Rebuild the summary and status tables from full history and write the
    /// CSV snapshots.
    pub async fn rebuild_reports(&self) -> anyhow::Result<()> {
        let resolutions = self.repo.all_resolutions().await?;
        let samples = self.repo.all_samples().await?;

        let rows = summary::summarize(&resolutions, &samples);
        self.repo.replace_summary(&rows).await?;

        let current_ip = hosts::operational_ip(
            &self.config.report.hosts_file,
            &self.config.options.download_domain,
        );
        let metrics =
            summary::status_metrics(&resolutions, &samples, &rows, &current_ip, chrono::Utc::now());
        self.repo.replace_status(&metrics).await?;

        let dir = Path::new(&self.config.report.output_dir);
        report::write_summary_csv(&rows, &dir.join("summary.csv"))?;
        report::write_status_csv(&metrics, &dir.join("status.csv"))?;
        info!(summary_rows = rows.len(), "reports rebuilt");
        Ok(())
    }

    /// Drop history older than the configured horizon; occasionally compact.
    pub async fn apply_retention(&self) -> anyhow::Result<()> {
        let (resolutions_pruned, samples_pruned) =
            self.repo.prune(&self.config.options.delete_period).await?;
        info!(resolutions_pruned, samples_pruned, "retention applied");

        if rand::thread_rng().gen_range(1..=VACUUM_ODDS) == 1 {
            self.repo.vacuum().await?;
            info!("vacuum complete");
        }
        Ok(())
    }
}
