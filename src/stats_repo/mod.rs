// SQLite measurement history. resolutions/samples are append-only;
// summary/status are derived and fully rebuilt by each report pass.

pub mod summary;

use crate::models::{Resolution, Sample, StatusMetric, SummaryRow};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct StatsRepo {
    pool: SqlitePool,
}

impl StatsRepo {
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resolutions (
                timestamp TEXT PRIMARY KEY NOT NULL,
                cdn TEXT NOT NULL,
                ip TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS samples (
                timestamp TEXT NOT NULL,
                cdn TEXT NOT NULL,
                ip TEXT NOT NULL,
                bandwidth REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_resolutions_cdn ON resolutions(cdn)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_samples_ip ON samples(ip)")
            .execute(&self.pool)
            .await?;

        summary::init_report_tables(&self.pool).await?;

        Ok(())
    }

    #[instrument(skip(self, r), fields(repo = "stats", operation = "record_resolution"))]
    pub async fn record_resolution(&self, r: &Resolution) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO resolutions (timestamp, cdn, ip) VALUES ($1, $2, $3)")
            .bind(&r.timestamp)
            .bind(&r.cdn)
            .bind(&r.ip)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, s), fields(repo = "stats", operation = "record_sample"))]
    pub async fn record_sample(&self, s: &Sample) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO samples (timestamp, cdn, ip, bandwidth) VALUES ($1, $2, $3, $4)")
            .bind(&s.timestamp)
            .bind(&s.cdn)
            .bind(&s.ip)
            .bind(s.bandwidth)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// A random previously-resolved IP for the given CDN; None until the CDN
    /// has been seen at least once (normal bootstrap state).
    pub async fn random_ip_for(&self, cdn: &str) -> anyhow::Result<Option<String>> {
        let ip = sqlx::query_scalar::<_, String>(
            "SELECT ip FROM resolutions WHERE cdn = $1 ORDER BY RANDOM() LIMIT 1",
        )
        .bind(cdn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ip)
    }

    /// Historically fastest (cdn, ip) pairs from the summary table as it
    /// stood after the previous report pass.
    pub async fn top_ips(&self, limit: u32) -> anyhow::Result<Vec<(String, String)>> {
        let rows = sqlx::query("SELECT cdn, ip FROM summary ORDER BY avg_bw DESC LIMIT $1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push((row.try_get("cdn")?, row.try_get("ip")?));
        }
        Ok(out)
    }

    /// Full resolution history, ascending by timestamp.
    pub async fn all_resolutions(&self) -> anyhow::Result<Vec<Resolution>> {
        let rows = sqlx::query("SELECT timestamp, cdn, ip FROM resolutions ORDER BY timestamp ASC")
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Resolution {
                timestamp: row.try_get("timestamp")?,
                cdn: row.try_get("cdn")?,
                ip: row.try_get("ip")?,
            });
        }
        Ok(out)
    }

    /// Full sample history, ascending by timestamp.
    pub async fn all_samples(&self) -> anyhow::Result<Vec<Sample>> {
        let rows =
            sqlx::query("SELECT timestamp, cdn, ip, bandwidth FROM samples ORDER BY timestamp ASC")
                .fetch_all(&self.pool)
                .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Sample {
                timestamp: row.try_get("timestamp")?,
                cdn: row.try_get("cdn")?,
                ip: row.try_get("ip")?,
                bandwidth: row.try_get("bandwidth")?,
            });
        }
        Ok(out)
    }

    /// Replace the summary table wholesale (one transaction).
    #[instrument(skip(self, rows), fields(repo = "stats", operation = "replace_summary", rows_count = rows.len()))]
    pub async fn replace_summary(&self, rows: &[SummaryRow]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM summary").execute(&mut *tx).await?;
        for r in rows {
            sqlx::query(
                "INSERT INTO summary (ip, cdn, min_bw, max_bw, avg_bw, tests, resolutions, percentage, last_resolved)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(&r.ip)
            .bind(&r.cdn)
            .bind(r.min_bw)
            .bind(r.max_bw)
            .bind(r.avg_bw)
            .bind(r.tests)
            .bind(r.resolutions)
            .bind(r.percentage)
            .bind(&r.last_resolved)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Replace the status table wholesale (one transaction).
    #[instrument(skip(self, metrics), fields(repo = "stats", operation = "replace_status"))]
    pub async fn replace_status(&self, metrics: &[StatusMetric]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM status").execute(&mut *tx).await?;
        for m in metrics {
            sqlx::query("INSERT INTO status (name, value) VALUES ($1, $2)")
                .bind(&m.name)
                .bind(&m.value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn load_summary(&self) -> anyhow::Result<Vec<SummaryRow>> {
        let rows = sqlx::query(
            "SELECT ip, cdn, min_bw, max_bw, avg_bw, tests, resolutions, percentage, last_resolved
             FROM summary ORDER BY ip ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(SummaryRow {
                ip: row.try_get("ip")?,
                cdn: row.try_get("cdn")?,
                min_bw: row.try_get("min_bw")?,
                max_bw: row.try_get("max_bw")?,
                avg_bw: row.try_get("avg_bw")?,
                tests: row.try_get("tests")?,
                resolutions: row.try_get("resolutions")?,
                percentage: row.try_get("percentage")?,
                last_resolved: row.try_get("last_resolved")?,
            });
        }
        Ok(out)
    }

    pub async fn load_status(&self) -> anyhow::Result<Vec<StatusMetric>> {
        let rows = sqlx::query("SELECT name, value FROM status")
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(StatusMetric {
                name: row.try_get("name")?,
                value: row.try_get("value")?,
            });
        }
        Ok(out)
    }

    /// Delete resolution/sample rows older than the relative horizon
    /// (e.g. "-30 days"). Returns (resolutions, samples) rows removed.
    #[instrument(skip(self), fields(repo = "stats", operation = "prune"))]
    pub async fn prune(&self, delete_period: &str) -> anyhow::Result<(u64, u64)> {
        let mut tx = self.pool.begin().await?;
        let res = sqlx::query("DELETE FROM resolutions WHERE timestamp < DATETIME('now', $1)")
            .bind(delete_period)
            .execute(&mut *tx)
            .await?;
        let smp = sqlx::query("DELETE FROM samples WHERE timestamp < DATETIME('now', $1)")
            .bind(delete_period)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok((res.rows_affected(), smp.rows_affected()))
    }

    /// Reclaim space after deletes (run occasionally after pruning).
    #[instrument(skip(self), fields(repo = "stats", operation = "vacuum"))]
    pub async fn vacuum(&self) -> anyhow::Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}
