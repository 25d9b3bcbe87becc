//! ICMP echo prober.
//!
//! # Responsibilities
//! - Send a bounded series of echo requests to one target
//! - Apply a fixed timeout to every attempt
//! - Average the round trips of the replies that came back

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, ICMP};

use crate::config::ProbeConfig;
use crate::discovery::Target;
use crate::probe::{ProbeError, ProbeResult, Prober};

/// Measures targets with ICMP echo requests.
pub struct IcmpProber {
    v4: Client,
    v6: Option<Client>,
    count: u16,
    attempt_timeout: Duration,
    send_interval: Duration,
    payload: Vec<u8>,
}

impl IcmpProber {
    /// Open the ICMP sockets. Must be called inside a Tokio runtime.
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let v4 = Client::new(&Config::default()).map_err(|e| ProbeError::Socket(e.to_string()))?;

        let v6 = match Client::new(&Config::builder().kind(ICMP::V6).build()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "ICMPv6 socket unavailable, IPv6 targets will fail to probe");
                None
            }
        };

        Ok(Self {
            v4,
            v6,
            count: config.count,
            attempt_timeout: config.attempt_timeout(),
            send_interval: config.send_interval(),
            payload: vec![0; config.payload_size],
        })
    }

    fn client_for(&self, target: &Target, ip: &IpAddr) -> Result<&Client, ProbeError> {
        match ip {
            IpAddr::V4(_) => Ok(&self.v4),
            IpAddr::V6(_) => self.v6.as_ref().ok_or_else(|| ProbeError::Init {
                address: target.address.clone(),
                reason: "no ICMPv6 socket".to_string(),
            }),
        }
    }
}

/// Parse a target address for probing.
pub fn parse_address(target: &Target) -> Result<IpAddr, ProbeError> {
    if target.address.is_empty() {
        return Err(ProbeError::Init {
            address: String::new(),
            reason: "empty address".to_string(),
        });
    }

    target.address.parse().map_err(|e: std::net::AddrParseError| ProbeError::Init {
        address: target.address.clone(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, target: &Target) -> Result<ProbeResult, ProbeError> {
        let ip = parse_address(target)?;
        let client = self.client_for(target, &ip)?;

        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(self.attempt_timeout);

        let mut round_trips = Vec::with_capacity(self.count as usize);
        for seq in 0..self.count {
            if seq > 0 {
                tokio::time::sleep(self.send_interval).await;
            }

            match pinger.ping(PingSequence(seq), &self.payload).await {
                Ok((_, rtt)) => round_trips.push(rtt),
                Err(e) => tracing::trace!(
                    address = %target.address,
                    seq,
                    error = %e,
                    "Echo request unanswered"
                ),
            }
        }

        tracing::trace!(
            address = %target.address,
            sent = self.count,
            received = round_trips.len(),
            "Echo series finished"
        );

        Ok(ProbeResult::from_round_trips(target.clone(), &round_trips))
    }
}
