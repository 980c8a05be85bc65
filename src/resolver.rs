// Native DNS resolution for the download domain. Replaces shelling out to a
// resolver utility: one A-record lookup with an explicit timeout, the CNAME
// chain classified against the known CDN signatures.

use crate::models::Cdn;
use hickory_resolver::Resolver;
use hickory_resolver::config::ResolverOpts;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType};
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

type TokioResolver = Resolver<TokioConnectionProvider>;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Resolver could not be constructed from the system configuration.
    #[error("resolver init failed: {0}")]
    Init(String),
    /// The lookup itself failed (network, timeout, NXDOMAIN).
    #[error("dns lookup failed: {0}")]
    Lookup(String),
    /// The response carried no A record to measure against.
    #[error("no A record returned for {0}")]
    NoAddress(String),
}

/// Outcome of one DNS check: which CDN the domain currently routes to,
/// the first IPv4 in the answer, and the CNAME chain that led there.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub cdn: Cdn,
    pub ip: Ipv4Addr,
    pub chain: Vec<String>,
}

pub struct DomainResolver {
    resolver: TokioResolver,
}

impl DomainResolver {
    /// Build a resolver from the system DNS configuration with a bounded
    /// per-query timeout and no retransmissions.
    pub fn from_system_conf(timeout: Duration) -> Result<Self, ResolveError> {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        let builder =
            Resolver::builder_tokio().map_err(|e| ResolveError::Init(e.to_string()))?;
        Ok(Self {
            resolver: builder.with_options(opts).build(),
        })
    }

    /// Resolve the domain and classify the route. The answer section is
    /// walked in order: CNAME targets feed the classifier, the first A
    /// record supplies the IP.
    pub async fn resolve(&self, domain: &str) -> Result<ResolvedRoute, ResolveError> {
        let lookup = self
            .resolver
            .lookup(domain, RecordType::A)
            .await
            .map_err(|e| ResolveError::Lookup(e.to_string()))?;

        let mut chain: Vec<String> = Vec::new();
        let mut ip: Option<Ipv4Addr> = None;
        for record in lookup.records() {
            match record.data() {
                RData::CNAME(target) => chain.push(target.to_utf8()),
                RData::A(a) => {
                    if ip.is_none() {
                        ip = Some(a.0);
                    }
                }
                _ => {}
            }
        }

        let ip = ip.ok_or_else(|| ResolveError::NoAddress(domain.to_string()))?;
        let cdn = Cdn::classify_chain(&chain);
        debug!(%ip, %cdn, chain = ?chain, "resolved route");

        Ok(ResolvedRoute { cdn, ip, chain })
    }
}
