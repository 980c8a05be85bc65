// Domain models: CDN classification and the four persisted row kinds.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage timestamp format (UTC). Lexicographic order equals chronological
/// order, so SQLite string comparisons against DATETIME('now', ...) work.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time as a storage timestamp string.
pub fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a storage timestamp back into a UTC datetime.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|n| n.and_utc())
}

/// Round to 2 decimal places (report precision for bandwidth and percentages).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// CDN provider backing a resolved route; classified by hostname signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cdn {
    Akamai,
    Limelight,
    Level3,
    CloudFront,
    Unknown,
}

impl Cdn {
    /// The four providers we actively measure (excludes Unknown).
    pub const KNOWN: [Cdn; 4] = [Cdn::Akamai, Cdn::Limelight, Cdn::Level3, Cdn::CloudFront];

    /// Classify a single hostname by substring signature. First matching
    /// rule wins; anything else is an explicit Unknown.
    pub fn from_hostname(host: &str) -> Self {
        if host.contains("edgesuite.net") {
            Cdn::Akamai
        } else if host.contains("l02.cdn") {
            Cdn::Limelight
        } else if host.contains("footprint.net") {
            Cdn::Level3
        } else if host.contains("cloudfront.net") {
            Cdn::CloudFront
        } else {
            Cdn::Unknown
        }
    }

    /// Classify a CNAME chain: the first hostname that matches a signature
    /// decides; a chain with no match is Unknown.
    pub fn classify_chain<S: AsRef<str>>(chain: &[S]) -> Self {
        chain
            .iter()
            .map(|h| Cdn::from_hostname(h.as_ref()))
            .find(|c| *c != Cdn::Unknown)
            .unwrap_or(Cdn::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cdn::Akamai => "Akamai",
            Cdn::Limelight => "Limelight",
            Cdn::Level3 => "Level3",
            Cdn::CloudFront => "CloudFront",
            Cdn::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Cdn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One DNS lookup outcome. Append-only; timestamp is the unique key.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub timestamp: String,
    pub cdn: String,
    pub ip: String,
}

/// One throughput measurement against a specific IP, in Mbit/s.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: String,
    pub cdn: String,
    pub ip: String,
    pub bandwidth: f64,
}

/// Per-IP aggregate, fully rebuilt from history on every report pass.
/// IPs without samples carry defined zeros, not absent values.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub ip: String,
    pub cdn: String,
    pub min_bw: f64,
    pub max_bw: f64,
    pub avg_bw: f64,
    pub tests: i64,
    pub resolutions: i64,
    pub percentage: f64,
    pub last_resolved: String,
}

/// One labeled global metric for the status report.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMetric {
    pub name: String,
    pub value: String,
}

impl StatusMetric {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
