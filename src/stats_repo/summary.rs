// Report aggregation: schema for the derived tables + pure rebuild logic.
// DB access (fetch history, replace tables) stays in stats_repo::mod.

use std::collections::BTreeMap;

use crate::models::{Cdn, Resolution, Sample, StatusMetric, SummaryRow, parse_timestamp, round2};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Creates the summary and status tables if not present.
pub async fn init_report_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS summary (
            ip TEXT NOT NULL,
            cdn TEXT NOT NULL,
            min_bw REAL NOT NULL,
            max_bw REAL NOT NULL,
            avg_bw REAL NOT NULL,
            tests INTEGER NOT NULL,
            resolutions INTEGER NOT NULL,
            percentage REAL NOT NULL,
            last_resolved TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS status (
            name TEXT NOT NULL,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Rebuild the per-IP summary from full history. Pure and order-independent:
/// the CDN label comes from the earliest resolution of each IP, last_resolved
/// from the latest, and rows are sorted by IP string. IPs with no samples get
/// defined zeros so the report shape stays stable.
pub fn summarize(resolutions: &[Resolution], samples: &[Sample]) -> Vec<SummaryRow> {
    let total = resolutions.len();
    let mut by_ip: BTreeMap<&str, Vec<&Resolution>> = BTreeMap::new();
    for r in resolutions {
        by_ip.entry(r.ip.as_str()).or_default().push(r);
    }

    let mut out = Vec::with_capacity(by_ip.len());
    for (ip, rs) in by_ip {
        let bws: Vec<f64> = samples
            .iter()
            .filter(|s| s.ip == ip)
            .map(|s| s.bandwidth)
            .collect();
        let (min_bw, max_bw, avg_bw) = if bws.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                bws.iter().copied().fold(f64::INFINITY, f64::min),
                bws.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                round2(mean_f64(&bws)),
            )
        };

        let earliest = rs
            .iter()
            .min_by(|a, b| a.timestamp.cmp(&b.timestamp))
            .expect("group is non-empty");
        let last_resolved = rs
            .iter()
            .map(|r| r.timestamp.as_str())
            .max()
            .expect("group is non-empty")
            .to_string();

        out.push(SummaryRow {
            ip: ip.to_string(),
            cdn: earliest.cdn.clone(),
            min_bw,
            max_bw,
            avg_bw,
            tests: bws.len() as i64,
            resolutions: rs.len() as i64,
            percentage: round2(rs.len() as f64 / total as f64 * 100.0),
            last_resolved,
        });
    }
    out
}

/// Global status metrics as a typed name/value list.
pub fn status_metrics(
    resolutions: &[Resolution],
    samples: &[Sample],
    summary: &[SummaryRow],
    current_ip: &str,
    now: DateTime<Utc>,
) -> Vec<StatusMetric> {
    let mut out = vec![
        StatusMetric::new("Number of DNS Lookups", resolutions.len().to_string()),
        StatusMetric::new("Number of Download Tests", samples.len().to_string()),
        StatusMetric::new("Current Configured IP", current_ip),
        StatusMetric::new(
            "Recommended IP",
            recommended_ip(summary, now).unwrap_or_else(|| "Unknown".to_string()),
        ),
    ];

    for cdn in Cdn::KNOWN {
        let bws: Vec<f64> = samples
            .iter()
            .filter(|s| s.cdn == cdn.as_str())
            .map(|s| s.bandwidth)
            .collect();
        out.push(StatusMetric::new(
            format!("Avg. {} Throughput (Mbit/s)", cdn),
            format!("{:.2}", round2(mean_f64(&bws))),
        ));
    }

    for cdn in Cdn::KNOWN {
        let count = resolutions.iter().filter(|r| r.cdn == cdn.as_str()).count();
        let chance = if resolutions.is_empty() {
            0.0
        } else {
            round2(count as f64 / resolutions.len() as f64 * 100.0)
        };
        out.push(StatusMetric::new(
            format!("Chance of {} IP (%)", cdn),
            format!("{:.2}", chance),
        ));
    }

    out
}

/// The IP with the highest average bandwidth among IPs resolved within the
/// last 24 hours. Ties go to the most recent resolution, then to the smaller
/// IP string. None when nothing qualifies.
pub fn recommended_ip(summary: &[SummaryRow], now: DateTime<Utc>) -> Option<String> {
    let cutoff = now - chrono::Duration::hours(24);
    let mut best: Option<&SummaryRow> = None;
    for row in summary {
        let Some(ts) = parse_timestamp(&row.last_resolved) else {
            continue;
        };
        if ts < cutoff {
            continue;
        }
        best = Some(match best {
            None => row,
            Some(b) => {
                let wins = row.avg_bw > b.avg_bw
                    || (row.avg_bw == b.avg_bw
                        && (row.last_resolved > b.last_resolved
                            || (row.last_resolved == b.last_resolved && row.ip < b.ip)));
                if wins { row } else { b }
            }
        });
    }
    best.map(|r| r.ip.clone())
}

fn mean_f64(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / (v.len() as f64)
}
