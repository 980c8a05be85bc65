// Best-effort lookup of the operational IP from a hosts-alias file.

/// IP the domain is currently pinned to in the hosts file. "None" when no
/// alias line matches, "Unknown" when the file cannot be read at all.
pub fn operational_ip(path: &str, domain: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => find_alias(&contents, domain).unwrap_or_else(|| "None".to_string()),
        Err(_) => "Unknown".to_string(),
    }
}

fn find_alias(contents: &str, domain: &str) -> Option<String> {
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let ip = fields.next()?;
        if fields.any(|name| name == domain) && ip.parse::<std::net::IpAddr>().is_ok() {
            return Some(ip.to_string());
        }
    }
    None
}
