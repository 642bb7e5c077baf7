//! Address selection rules
//!
//! A rule string picks (or synthesizes) exactly one address from a candidate
//! list. Four shapes exist, tried in this order:
//!
//! | Rule string              | Strategy                                   |
//! |--------------------------|--------------------------------------------|
//! | `""`                     | [`Rule::Default`]: first candidate         |
//! | `"@N"`                   | [`Rule::Indexed`]: N-th candidate, 1-based |
//! | contains `:`             | [`Rule::Splice`]: IPv6 suffix splice       |
//! | anything else            | [`Rule::Filter`]: substring match          |
//!
//! Splice rules take the form `<ipv6-suffix>[/<prefix-len>]`. The prefix
//! length defaults to 64 and must be a multiple of 8 when matching.
//!
//! Any rule containing `:` is a splice rule, so a filter on a textual IPv6
//! fragment such as `2001:` is treated as a (likely failing) splice. Rules
//! without a colon, such as `781d/64`, are substring filters.
//!
//! ## Leniency
//!
//! [`Rule::parse`] never fails: an unparsable `@N` selects index 0, an
//! out-of-range index falls back to the first candidate, and a malformed
//! `/prefix` keeps the whole rule as the identifier at /64.
//! [`Rule::parse_strict`] turns each of these into an error instead.

pub mod suffix;

pub use suffix::parse_suffix;

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use tracing::warn;

use crate::error::{Error, Result};

/// Prefix length used when a splice rule does not give a valid one
pub const DEFAULT_PREFIX_LEN: i64 = 64;

/// A parsed selection rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// First candidate
    Default,

    /// Candidate at a 0-based `index`
    Indexed {
        /// 0-based position (N - 1 for `@N`)
        index: i64,
        /// Whether an out-of-range index falls back to the first candidate
        clamp: bool,
    },

    /// First IPv6 candidate with its host bits replaced by `identifier`
    Splice {
        /// Partial or compressed IPv6 literal supplying the host bits
        identifier: String,
        /// Leading bits kept from the candidate
        prefix_len: i64,
    },

    /// First candidate whose textual form contains `pattern`
    Filter {
        /// Literal substring
        pattern: String,
    },
}

impl Rule {
    /// Classify a rule string
    ///
    /// Total: every input produces a rule.
    pub fn parse(rule: &str) -> Self {
        if rule.is_empty() {
            return Rule::Default;
        }

        if let Some(rest) = rule.strip_prefix('@') {
            let n = scan_leading_int(rest).unwrap_or(0);
            return Rule::Indexed {
                index: n.saturating_sub(1),
                clamp: true,
            };
        }

        if rule.contains(':') {
            let parts: Vec<&str> = rule.split('/').collect();
            if let [identifier, prefix] = parts.as_slice()
                && let Ok(prefix_len) = prefix.parse::<i64>()
                && (0..=128).contains(&prefix_len)
            {
                return Rule::Splice {
                    identifier: identifier.to_string(),
                    prefix_len,
                };
            }
            return Rule::Splice {
                identifier: rule.to_string(),
                prefix_len: DEFAULT_PREFIX_LEN,
            };
        }

        Rule::Filter {
            pattern: rule.to_string(),
        }
    }

    /// Classify a rule string, rejecting anything [`Rule::parse`] would
    /// silently repair
    ///
    /// - `@N` requires N to be a positive integer, and the resulting rule
    ///   errors on an out-of-range index instead of clamping
    /// - a splice rule takes at most one `/`, and the prefix length must be an
    ///   integer in `0..=128`
    /// - the splice identifier must decode as an IPv6 suffix
    pub fn parse_strict(rule: &str) -> Result<Self> {
        if rule.is_empty() {
            return Ok(Rule::Default);
        }

        if let Some(rest) = rule.strip_prefix('@') {
            let n = rest
                .parse::<i64>()
                .map_err(|_| Error::invalid_rule(rule, "expected @N with N a positive integer"))?;
            if n < 1 {
                return Err(Error::invalid_rule(rule, "N in @N starts at 1"));
            }
            return Ok(Rule::Indexed {
                index: n - 1,
                clamp: false,
            });
        }

        if rule.contains(':') {
            let (identifier, prefix_len) = match rule.split_once('/') {
                None => (rule, DEFAULT_PREFIX_LEN),
                Some((identifier, prefix)) => {
                    let prefix_len = prefix.parse::<i64>().map_err(|_| {
                        Error::invalid_rule(rule, format!("prefix length {:?} is not an integer", prefix))
                    })?;
                    if !(0..=128).contains(&prefix_len) {
                        return Err(Error::invalid_rule(
                            rule,
                            format!("prefix length {} outside 0..=128", prefix_len),
                        ));
                    }
                    (identifier, prefix_len)
                }
            };
            parse_suffix(identifier).map_err(|source| Error::InvalidSuffix {
                identifier: identifier.to_string(),
                source,
            })?;
            return Ok(Rule::Splice {
                identifier: identifier.to_string(),
                prefix_len,
            });
        }

        Ok(Rule::Filter {
            pattern: rule.to_string(),
        })
    }

    /// Short strategy name (for logging/debugging)
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Default => "default",
            Rule::Indexed { .. } => "indexed",
            Rule::Splice { .. } => "splice",
            Rule::Filter { .. } => "filter",
        }
    }

    /// Pick one address from `candidates`
    ///
    /// # Errors
    ///
    /// - [`Error::NoCandidates`] for an empty list
    /// - [`Error::IndexOutOfRange`] for a strict index past the end
    /// - [`Error::NoFilterMatch`] when no candidate contains the pattern
    /// - [`Error::InvalidPrefixLength`] / [`Error::UnalignedPrefixLength`]
    ///   for a splice prefix outside `0..=128` or not a multiple of 8
    /// - [`Error::InvalidSuffix`] when the splice identifier does not decode
    /// - [`Error::NoIpv6Candidate`] when a splice finds no IPv6 candidate
    pub fn select(&self, candidates: &[IpAddr]) -> Result<IpAddr> {
        let Some(first) = candidates.first() else {
            return Err(Error::NoCandidates);
        };

        match self {
            Rule::Default => Ok(*first),
            Rule::Indexed { index, clamp } => {
                let position = usize::try_from(*index)
                    .ok()
                    .filter(|position| *position < candidates.len());
                match position {
                    Some(position) => Ok(candidates[position]),
                    None if *clamp => {
                        warn!(
                            "Index @{} out of range for {} candidate(s), using the first",
                            index.saturating_add(1),
                            candidates.len()
                        );
                        Ok(*first)
                    }
                    None => Err(Error::IndexOutOfRange {
                        index: index.saturating_add(1),
                        len: candidates.len(),
                    }),
                }
            }
            Rule::Filter { pattern } => candidates
                .iter()
                .find(|ip| ip.to_string().contains(pattern.as_str()))
                .copied()
                .ok_or_else(|| Error::NoFilterMatch {
                    pattern: pattern.clone(),
                }),
            Rule::Splice {
                identifier,
                prefix_len,
            } => splice(candidates, identifier, *prefix_len),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Default => Ok(()),
            Rule::Indexed { index, .. } => write!(f, "@{}", index.saturating_add(1)),
            Rule::Splice {
                identifier,
                prefix_len,
            } => write!(f, "{}/{}", identifier, prefix_len),
            Rule::Filter { pattern } => f.write_str(pattern),
        }
    }
}

/// Overlay the suffix onto the first IPv6 candidate from byte `prefix_len / 8` on
fn splice(candidates: &[IpAddr], identifier: &str, prefix_len: i64) -> Result<IpAddr> {
    if !(0..=128).contains(&prefix_len) {
        return Err(Error::InvalidPrefixLength(prefix_len));
    }
    if prefix_len % 8 != 0 {
        return Err(Error::UnalignedPrefixLength(prefix_len));
    }

    let suffix = parse_suffix(identifier).map_err(|source| Error::InvalidSuffix {
        identifier: identifier.to_string(),
        source,
    })?;
    let start = (prefix_len / 8) as usize;

    // IPv4-mapped addresses render in dotted form and are not IPv6 candidates
    let base = candidates
        .iter()
        .find_map(|ip| match ip {
            IpAddr::V6(v6) if v6.to_ipv4_mapped().is_none() => Some(*v6),
            _ => None,
        })
        .ok_or_else(|| Error::NoIpv6Candidate {
            identifier: identifier.to_string(),
        })?;

    let mut octets = base.octets();
    octets[start..].copy_from_slice(&suffix[start..]);
    Ok(IpAddr::V6(Ipv6Addr::from(octets)))
}

/// Leading decimal integer of `s` after optional whitespace and sign
///
/// Trailing text is ignored; `None` when no digits follow or on overflow.
fn scan_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits_len = s[sign_len..]
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits_len == 0 {
        return None;
    }
    s[..sign_len + digits_len].parse().ok()
}
