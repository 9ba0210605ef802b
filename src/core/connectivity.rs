use std::net::{Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// Answers "does this machine currently have a network route at all?".
///
/// Used to tell an offline client apart from an unreachable server when a
/// request fails at the transport level.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Asks the OS for a route to a public address, over IPv4 and then IPv6.
///
/// Connecting a UDP socket only selects a route; no packet is sent.
pub struct SystemConnectivity {
    probes: Vec<SocketAddr>,
}

impl SystemConnectivity {
    pub fn new() -> Self {
        Self::with_probes(vec![
            SocketAddr::from(([1, 1, 1, 1], 53)),
            SocketAddr::from((Ipv6Addr::new(0x2606, 0x4700, 0x4700, 0, 0, 0, 0, 0x1111), 53)),
        ])
    }

    pub fn with_probes(probes: Vec<SocketAddr>) -> Self {
        Self { probes }
    }
}

async fn has_route(probe: SocketAddr) -> bool {
    let local = if probe.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let Ok(socket) = UdpSocket::bind(local).await else {
        return false;
    };
    socket.connect(probe).await.is_ok()
}

impl Default for SystemConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connectivity for SystemConnectivity {
    async fn is_online(&self) -> bool {
        for probe in &self.probes {
            if has_route(*probe).await {
                return true;
            }
        }
        false
    }
}

/// Fixed answer, for tests and for callers that already know.
pub struct FixedConnectivity(pub bool);

#[async_trait]
impl Connectivity for FixedConnectivity {
    async fn is_online(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_probes_cover_both_address_families() {
        let connectivity = SystemConnectivity::default();
        assert!(connectivity.probes.iter().any(SocketAddr::is_ipv4));
        assert!(connectivity.probes.iter().any(SocketAddr::is_ipv6));
    }

    #[tokio::test]
    async fn loopback_probe_has_a_route() {
        let connectivity =
            SystemConnectivity::with_probes(vec![SocketAddr::from(([127, 0, 0, 1], 53))]);
        assert!(connectivity.is_online().await);
    }

    #[tokio::test]
    async fn no_probes_means_offline() {
        assert!(!SystemConnectivity::with_probes(Vec::new()).is_online().await);
    }
}
