//! Family filtering and single-address resolution
//!
//! [`resolve`] is the last step of the pipeline: candidates extracted from
//! command output are narrowed to the family of the record being published,
//! then the record's [`Rule`] picks exactly one of them.

use std::net::IpAddr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::rule::Rule;
use crate::traits::IpVersion;

/// Keep the candidates of one address family, in order
///
/// IPv4-mapped IPv6 addresses count as IPv4, and are returned in their
/// 4-byte form.
///
/// # Errors
///
/// [`Error::NoFamilyMatch`] when no candidate belongs to `version`.
pub fn select_family(version: IpVersion, candidates: &[IpAddr]) -> Result<Vec<IpAddr>> {
    let filtered: Vec<IpAddr> = candidates
        .iter()
        .map(|ip| ip.to_canonical())
        .filter(|ip| IpVersion::of(ip) == version)
        .collect();

    if filtered.is_empty() {
        return Err(Error::NoFamilyMatch { version });
    }
    Ok(filtered)
}

/// Resolve the single address to publish
///
/// Family errors ([`Error::NoFamilyMatch`]) and rule errors stay distinct.
pub fn resolve(version: IpVersion, candidates: &[IpAddr], rule: &Rule) -> Result<IpAddr> {
    let filtered = select_family(version, candidates)?;
    let ip = rule.select(&filtered)?;
    debug!(
        "Rule {:?} ({}) selected {} from {} {} candidate(s)",
        rule.to_string(),
        rule.kind(),
        ip,
        filtered.len(),
        version
    );
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn ips(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_select_family_splits_by_version() {
        let candidates = ips(&["2001:db8::1", "203.0.113.1", "2001:db8::2", "198.51.100.1"]);

        assert_eq!(
            select_family(IpVersion::V4, &candidates).unwrap(),
            ips(&["203.0.113.1", "198.51.100.1"])
        );
        assert_eq!(
            select_family(IpVersion::V6, &candidates).unwrap(),
            ips(&["2001:db8::1", "2001:db8::2"])
        );
    }

    #[test]
    fn test_mapped_address_is_ipv4() {
        let mapped: Ipv6Addr = "::ffff:203.0.113.1".parse().unwrap();
        let candidates = vec![IpAddr::V6(mapped)];

        assert_eq!(
            select_family(IpVersion::V4, &candidates).unwrap(),
            ips(&["203.0.113.1"])
        );
        assert!(matches!(
            select_family(IpVersion::V6, &candidates),
            Err(Error::NoFamilyMatch { version: IpVersion::V6 })
        ));
    }

    #[test]
    fn test_resolve_keeps_errors_distinct() {
        let candidates = ips(&["203.0.113.1"]);

        let err = resolve(IpVersion::V6, &candidates, &Rule::Default).unwrap_err();
        assert!(matches!(err, Error::NoFamilyMatch { .. }));

        let err = resolve(IpVersion::V4, &candidates, &Rule::parse("198.")).unwrap_err();
        assert!(matches!(err, Error::NoFilterMatch { .. }));
    }

    #[test]
    fn test_resolve_applies_rule_after_filtering() {
        let candidates = ips(&["203.0.113.1", "2001:db8::1", "198.51.100.1", "2001:db8::2"]);

        // @2 counts within the requested family only
        assert_eq!(
            resolve(IpVersion::V4, &candidates, &Rule::parse("@2")).unwrap(),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            resolve(IpVersion::V6, &candidates, &Rule::parse("@2")).unwrap(),
            "2001:db8::2".parse::<IpAddr>().unwrap()
        );
    }
}
