// Shared test helpers

use cdnwatch::models::{Resolution, Sample};
use cdnwatch::stats_repo::StatsRepo;
use tempfile::TempDir;

pub async fn temp_repo() -> (TempDir, StatsRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stats.db");
    let repo = StatsRepo::connect(path.to_str().unwrap()).await.unwrap();
    repo.init().await.unwrap();
    (dir, repo)
}

pub fn resolution(timestamp: &str, cdn: &str, ip: &str) -> Resolution {
    Resolution {
        timestamp: timestamp.into(),
        cdn: cdn.into(),
        ip: ip.into(),
    }
}

pub fn sample(timestamp: &str, cdn: &str, ip: &str, bandwidth: f64) -> Sample {
    Sample {
        timestamp: timestamp.into(),
        cdn: cdn.into(),
        ip: ip.into(),
        bandwidth,
    }
}
