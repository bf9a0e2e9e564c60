//! ICMP echo pinger.
//!
//! # Responsibilities
//! - Resolve the target address
//! - Lazily open one shared ICMP socket per address family
//! - Send exactly one echo request and time the reply

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use socket2::Type;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError, ICMP};
use tokio::sync::OnceCell;

use crate::config::ProbeConfig;
use crate::probe::{Pinger, ProbeError, ProbeStats, Target};

/// Echo payload size in bytes.
const PAYLOAD: [u8; 24] = [0; 24];

/// Pinger backed by `surge-ping`.
pub struct IcmpPinger {
    timeout: Duration,
    privileged: bool,
    v4: OnceCell<Client>,
    v6: OnceCell<Client>,
}

impl IcmpPinger {
    pub fn new(timeout: Duration, privileged: bool) -> Self {
        Self {
            timeout,
            privileged,
            v4: OnceCell::new(),
            v6: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs), config.privileged)
    }

    fn socket_config(&self, kind: ICMP) -> Config {
        let sock_type = if self.privileged {
            Type::RAW
        } else {
            Type::DGRAM
        };
        Config::builder().kind(kind).sock_type_hint(sock_type).build()
    }

    /// A failed open is not cached, so the next cycle tries again.
    async fn client_for(&self, ip: IpAddr) -> Result<&Client, ProbeError> {
        let (cell, kind) = match ip {
            IpAddr::V4(_) => (&self.v4, ICMP::V4),
            IpAddr::V6(_) => (&self.v6, ICMP::V6),
        };

        cell.get_or_try_init(|| async {
            Client::new(&self.socket_config(kind)).map_err(ProbeError::Socket)
        })
        .await
    }
}

impl std::fmt::Debug for IcmpPinger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpPinger")
            .field("timeout", &self.timeout)
            .field("privileged", &self.privileged)
            .finish_non_exhaustive()
    }
}

/// Resolve a host string to an IP address.
pub(crate) async fn resolve_host(host: &str) -> Result<IpAddr, ProbeError> {
    if host.is_empty() {
        return Err(ProbeError::InvalidAddress(host.to_string()));
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let resolve_err = |source| ProbeError::Resolve {
        host: host.to_string(),
        source,
    };
    let mut addrs = tokio::net::lookup_host(format!("{host}:0"))
        .await
        .map_err(resolve_err)?;
    addrs.next().map(|addr| addr.ip()).ok_or_else(|| {
        resolve_err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no addresses found",
        ))
    })
}

#[async_trait]
impl Pinger for IcmpPinger {
    async fn ping(&self, target: &Target) -> Result<ProbeStats, ProbeError> {
        let ip = resolve_host(&target.address).await?;
        let client = self.client_for(ip).await?;

        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);

        let result = pinger.ping(PingSequence(0), &PAYLOAD).await;
        if let Err(e) = &result {
            tracing::debug!(name = %target.name, address = %target.address, error = %e, "Echo request failed");
        }
        Ok(stats_from(result.map(|(_, rtt)| rtt)))
    }
}

/// Outcome of one echo request as probe statistics.
///
/// A timeout or a rejected reply counts as sent and lost; an IO error means
/// the request never left the socket.
fn stats_from(result: Result<Duration, SurgeError>) -> ProbeStats {
    match result {
        Ok(rtt) => ProbeStats::replied(rtt),
        Err(SurgeError::Timeout { .. }) => ProbeStats::lost(),
        Err(SurgeError::IOError(e)) => {
            tracing::warn!(error = %e, "Echo request could not be sent");
            ProbeStats::unsent()
        }
        Err(_) => ProbeStats::lost(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_host_ipv4() {
        let ip = resolve_host("10.0.0.1").await.unwrap();
        assert_eq!(ip, IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[tokio::test]
    async fn test_resolve_host_ipv6() {
        let ip = resolve_host("::1").await.unwrap();
        assert_eq!(ip, IpAddr::V6(std::net::Ipv6Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_resolve_empty_address() {
        let err = resolve_host("").await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidAddress(_)));
        assert_eq!(err.reason(), "invalid_address");
    }

    #[test]
    fn test_reply_is_received() {
        let stats = stats_from(Ok(Duration::from_millis(7)));
        assert_eq!(stats, ProbeStats::replied(Duration::from_millis(7)));
        assert_eq!(stats.loss(), 0.0);
    }

    #[test]
    fn test_timeout_is_lost() {
        let stats = stats_from(Err(SurgeError::Timeout { seq: PingSequence(0) }));
        assert_eq!((stats.sent, stats.recv), (1, 0));
        assert_eq!(stats.loss(), 1.0);
    }

    #[test]
    fn test_send_error_is_unsent() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let stats = stats_from(Err(SurgeError::IOError(err)));
        assert_eq!((stats.sent, stats.recv), (0, 0));
        assert_eq!(stats.loss(), 1.0);
    }

    #[test]
    fn test_rejected_reply_is_lost() {
        let stats = stats_from(Err(SurgeError::NetworkError));
        assert_eq!(stats, ProbeStats::lost());
    }

    #[test]
    fn test_from_config() {
        let pinger = IcmpPinger::from_config(&ProbeConfig::default());
        assert_eq!(pinger.timeout, Duration::from_secs(2));
        assert!(pinger.privileged);
    }
}
