// # Address Extraction
//
// Turns raw command output into the ordered list of candidate addresses.
//
// Each line holds at most one address literal, optionally padded with
// whitespace. Lines that are not a bare literal are skipped. IPv4-mapped IPv6
// literals (`::ffff:a.b.c.d`) are canonicalized to IPv4.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

use crate::error::{Error, Result};

/// Parse every global unicast address out of `raw`
///
/// Order is the order of first appearance; duplicates are kept.
///
/// # Errors
///
/// - [`Error::EmptyInput`] when `raw` is empty or whitespace-only
/// - [`Error::NoAddressFound`] when no line survives parsing and filtering
pub fn parse_addresses(raw: &str) -> Result<Vec<IpAddr>> {
    if raw.trim().is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut candidates = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        let Ok(ip) = line.parse::<IpAddr>() else {
            continue;
        };
        let ip = ip.to_canonical();
        if is_global_unicast(&ip) {
            candidates.push(ip);
        } else {
            debug!("Skipping non-global address {}", ip);
        }
    }

    if candidates.is_empty() {
        return Err(Error::NoAddressFound);
    }
    Ok(candidates)
}

/// Whether `ip` is usable as a published address
///
/// Rejects unspecified, loopback, multicast (including link-local multicast),
/// link-local unicast and the IPv4 limited broadcast address. Private ranges
/// (10/8, 172.16/12, 192.168/16, fc00::/7) pass.
pub fn is_global_unicast(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_global_unicast_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_global_unicast_v4(&v4),
            None => is_global_unicast_v6(v6),
        },
    }
}

fn is_global_unicast_v4(ip: &Ipv4Addr) -> bool {
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        || ip.is_link_local()
        || ip.is_broadcast())
}

fn is_global_unicast_v6(ip: &Ipv6Addr) -> bool {
    // fe80::/10
    let link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;
    !(ip.is_unspecified() || ip.is_loopback() || ip.is_multicast() || link_local)
}
