// Aggregation logic tests: summarize, status_metrics, recommended_ip

mod common;

use cdnwatch::models::{SummaryRow, TIMESTAMP_FORMAT};
use cdnwatch::stats_repo::summary::{recommended_ip, status_metrics, summarize};
use chrono::Utc;
use common::{resolution, sample};

fn ts_ago(hours: i64) -> String {
    (Utc::now() - chrono::Duration::hours(hours))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

#[test]
fn summarize_empty_history_is_empty() {
    assert!(summarize(&[], &[]).is_empty());
}

#[test]
fn summarize_end_to_end_scenario() {
    // 3 Akamai resolutions of one IP out of 10 total, samples [80, 100, 90].
    let mut resolutions = vec![
        resolution("2026-08-01 10:00:00", "Akamai", "1.2.3.4"),
        resolution("2026-08-02 10:00:00", "Akamai", "1.2.3.4"),
        resolution("2026-08-03 10:00:00", "Akamai", "1.2.3.4"),
    ];
    for day in 1..=7 {
        resolutions.push(resolution(
            &format!("2026-07-{:02} 10:00:00", day),
            "CloudFront",
            "5.6.7.8",
        ));
    }
    let samples = vec![
        sample("2026-08-01 11:00:00", "Akamai", "1.2.3.4", 80.0),
        sample("2026-08-02 11:00:00", "Akamai", "1.2.3.4", 100.0),
        sample("2026-08-03 11:00:00", "Akamai", "1.2.3.4", 90.0),
    ];

    let rows = summarize(&resolutions, &samples);
    assert_eq!(rows.len(), 2);

    let akamai = rows.iter().find(|r| r.ip == "1.2.3.4").unwrap();
    assert_eq!(akamai.cdn, "Akamai");
    assert_eq!(akamai.min_bw, 80.0);
    assert_eq!(akamai.max_bw, 100.0);
    assert_eq!(akamai.avg_bw, 90.0);
    assert_eq!(akamai.tests, 3);
    assert_eq!(akamai.resolutions, 3);
    assert_eq!(akamai.percentage, 30.0);
    assert_eq!(akamai.last_resolved, "2026-08-03 10:00:00");
}

#[test]
fn summarize_ip_without_samples_gets_defined_zeros() {
    let resolutions = vec![resolution("2026-08-01 10:00:00", "Level3", "9.9.9.9")];
    let rows = summarize(&resolutions, &[]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].min_bw, 0.0);
    assert_eq!(rows[0].max_bw, 0.0);
    assert_eq!(rows[0].avg_bw, 0.0);
    assert_eq!(rows[0].tests, 0);
    assert_eq!(rows[0].percentage, 100.0);
}

#[test]
fn summarize_is_idempotent_and_order_independent() {
    let resolutions = vec![
        resolution("2026-08-01 10:00:00", "Akamai", "1.2.3.4"),
        resolution("2026-08-02 10:00:00", "Limelight", "5.6.7.8"),
        resolution("2026-08-03 10:00:00", "Akamai", "1.2.3.4"),
    ];
    let samples = vec![
        sample("2026-08-01 11:00:00", "Akamai", "1.2.3.4", 50.0),
        sample("2026-08-02 11:00:00", "Limelight", "5.6.7.8", 75.0),
    ];

    let first = summarize(&resolutions, &samples);
    let second = summarize(&resolutions, &samples);
    assert_eq!(first, second);

    let mut shuffled_res = resolutions.clone();
    shuffled_res.reverse();
    let mut shuffled_smp = samples.clone();
    shuffled_smp.reverse();
    let reordered = summarize(&shuffled_res, &shuffled_smp);
    assert_eq!(first, reordered);
}

#[test]
fn summarize_cdn_label_comes_from_earliest_resolution() {
    // Same IP later classified differently keeps the earliest label.
    let resolutions = vec![
        resolution("2026-08-02 10:00:00", "Unknown", "1.2.3.4"),
        resolution("2026-08-01 10:00:00", "Akamai", "1.2.3.4"),
    ];
    let rows = summarize(&resolutions, &[]);
    assert_eq!(rows[0].cdn, "Akamai");
    assert_eq!(rows[0].last_resolved, "2026-08-02 10:00:00");
}

#[test]
fn summarize_percentages_sum_to_100() {
    let mut resolutions = Vec::new();
    for i in 0..3 {
        resolutions.push(resolution(
            &format!("2026-08-01 10:00:{:02}", i),
            "Akamai",
            "1.1.1.1",
        ));
    }
    for i in 0..7 {
        resolutions.push(resolution(
            &format!("2026-08-01 11:00:{:02}", i),
            "Level3",
            "2.2.2.2",
        ));
    }
    for i in 0..11 {
        resolutions.push(resolution(
            &format!("2026-08-01 12:00:{:02}", i),
            "CloudFront",
            "3.3.3.3",
        ));
    }
    let rows = summarize(&resolutions, &[]);
    let total: f64 = rows.iter().map(|r| r.percentage).sum();
    assert!((total - 100.0).abs() < 0.05, "total was {}", total);
}

fn summary_row(ip: &str, avg_bw: f64, last_resolved: &str) -> SummaryRow {
    SummaryRow {
        ip: ip.into(),
        cdn: "Akamai".into(),
        min_bw: 0.0,
        max_bw: 0.0,
        avg_bw,
        tests: 1,
        resolutions: 1,
        percentage: 100.0,
        last_resolved: last_resolved.into(),
    }
}

#[test]
fn recommended_ip_prefers_highest_average_within_window() {
    let rows = vec![
        summary_row("1.1.1.1", 50.0, &ts_ago(2)),
        summary_row("2.2.2.2", 90.0, &ts_ago(3)),
        summary_row("3.3.3.3", 120.0, &ts_ago(48)), // outside 24h window
    ];
    assert_eq!(
        recommended_ip(&rows, Utc::now()),
        Some("2.2.2.2".to_string())
    );
}

#[test]
fn recommended_ip_tie_breaks_on_most_recent_then_ip() {
    let recent = ts_ago(1);
    let older = ts_ago(10);
    let rows = vec![
        summary_row("9.9.9.9", 90.0, &older),
        summary_row("5.5.5.5", 90.0, &recent),
    ];
    assert_eq!(
        recommended_ip(&rows, Utc::now()),
        Some("5.5.5.5".to_string())
    );

    let rows = vec![
        summary_row("9.9.9.9", 90.0, &recent),
        summary_row("5.5.5.5", 90.0, &recent),
    ];
    assert_eq!(
        recommended_ip(&rows, Utc::now()),
        Some("5.5.5.5".to_string())
    );
}

#[test]
fn recommended_ip_none_when_nothing_qualifies() {
    assert_eq!(recommended_ip(&[], Utc::now()), None);
    let stale = vec![summary_row("1.1.1.1", 50.0, &ts_ago(25))];
    assert_eq!(recommended_ip(&stale, Utc::now()), None);
}

#[test]
fn status_metrics_full_set() {
    let resolutions = vec![
        resolution(&ts_ago(1), "Akamai", "1.2.3.4"),
        resolution(&ts_ago(2), "Akamai", "1.2.3.4"),
        resolution(&ts_ago(3), "CloudFront", "5.6.7.8"),
        resolution(&ts_ago(4), "Level3", "9.9.9.9"),
    ];
    let samples = vec![
        sample(&ts_ago(1), "Akamai", "1.2.3.4", 80.0),
        sample(&ts_ago(1), "Akamai", "1.2.3.4", 100.0),
    ];
    let summary = summarize(&resolutions, &samples);
    let metrics = status_metrics(&resolutions, &samples, &summary, "192.0.2.1", Utc::now());

    assert_eq!(metrics.len(), 12);
    let get = |name: &str| {
        metrics
            .iter()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("missing metric {}", name))
            .value
            .clone()
    };
    assert_eq!(get("Number of DNS Lookups"), "4");
    assert_eq!(get("Number of Download Tests"), "2");
    assert_eq!(get("Current Configured IP"), "192.0.2.1");
    assert_eq!(get("Recommended IP"), "1.2.3.4");
    assert_eq!(get("Avg. Akamai Throughput (Mbit/s)"), "90.00");
    assert_eq!(get("Avg. Limelight Throughput (Mbit/s)"), "0.00");
    assert_eq!(get("Chance of Akamai IP (%)"), "50.00");
    assert_eq!(get("Chance of CloudFront IP (%)"), "25.00");
    assert_eq!(get("Chance of Limelight IP (%)"), "0.00");
}

#[test]
fn status_metrics_empty_history() {
    let metrics = status_metrics(&[], &[], &[], "Unknown", Utc::now());
    let get = |name: &str| {
        metrics
            .iter()
            .find(|m| m.name == name)
            .unwrap()
            .value
            .clone()
    };
    assert_eq!(get("Number of DNS Lookups"), "0");
    assert_eq!(get("Recommended IP"), "Unknown");
    assert_eq!(get("Chance of Akamai IP (%)"), "0.00");
    assert_eq!(get("Avg. CloudFront Throughput (Mbit/s)"), "0.00");
}
