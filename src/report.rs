// CSV snapshots consumed by the static report page.

use crate::models::{StatusMetric, SummaryRow};
use std::fmt::Write as _;
use std::path::Path;

pub const SUMMARY_HEADER: &str = "IP Address,CDN,Min Throughput (Mbit/s),Max Throughput (Mbit/s),\
Avg Throughput (Mbit/s),Number of Downloads,Number of Resolutions,% of Total Resolutions,Last Resolved";

pub const STATUS_HEADER: &str = "Metric,Value";

/// Write the per-IP summary table. Parent directories are created as needed.
pub fn write_summary_csv(rows: &[SummaryRow], path: &Path) -> anyhow::Result<()> {
    let mut out = String::new();
    out.push_str(SUMMARY_HEADER);
    out.push('\n');
    for r in rows {
        writeln!(
            out,
            "{},{},{:.2},{:.2},{:.2},{},{},{:.2},{}",
            r.ip,
            r.cdn,
            r.min_bw,
            r.max_bw,
            r.avg_bw,
            r.tests,
            r.resolutions,
            r.percentage,
            r.last_resolved
        )?;
    }
    write_file(path, &out)
}

/// Write the global status metrics as name/value rows.
pub fn write_status_csv(metrics: &[StatusMetric], path: &Path) -> anyhow::Result<()> {
    let mut out = String::new();
    out.push_str(STATUS_HEADER);
    out.push('\n');
    for m in metrics {
        writeln!(out, "{},{}", m.name, m.value)?;
    }
    write_file(path, &out)
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}
