use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts},
};

use crate::error::ProbeError;

/// Name resolution used by the prober.
#[derive(Clone)]
pub enum Resolver {
    /// The operating system resolver, honouring /etc/hosts.
    System,
    /// Dedicated nameservers, queried over TCP.
    Nameservers(TokioAsyncResolver),
}

impl Resolver {
    /// Builds a resolver for the given nameservers, or the system resolver
    /// when none are configured.
    /// The dedicated resolver makes 2 attempts with a 2 second timeout and
    /// caches up to 1024 entries.
    pub fn new(dns_hosts: &[IpAddr]) -> Self {
        if dns_hosts.is_empty() {
            return Resolver::System;
        }

        let mut opts = ResolverOpts::default();
        opts.attempts = 2;
        opts.timeout = Duration::from_secs(2);
        opts.cache_size = 1024;

        let mut name_servers = NameServerConfigGroup::new();
        for ip in dns_hosts {
            name_servers.push(NameServerConfig {
                socket_addr: (*ip, 53).into(),
                protocol: Protocol::Tcp,
                tls_dns_name: None,
                trust_negative_responses: false,
                bind_addr: None,
            });
        }

        let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
        Resolver::Nameservers(TokioAsyncResolver::tokio(resolver_config, opts))
    }

    pub async fn lookup(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, ProbeError> {
        let addrs: Vec<SocketAddr> = match self {
            Resolver::System => tokio::net::lookup_host((host, port))
                .await
                .map_err(|source| ProbeError::Resolve {
                    host: host.to_string(),
                    source,
                })?
                .collect(),
            Resolver::Nameservers(resolver) => resolver
                .lookup_ip(host)
                .await
                .map_err(|source| ProbeError::Lookup {
                    host: host.to_string(),
                    source,
                })?
                .iter()
                .map(|ip| SocketAddr::new(ip, port))
                .collect(),
        };

        if addrs.is_empty() {
            return Err(ProbeError::NoAddress(host.to_string()));
        }
        Ok(addrs)
    }
}
