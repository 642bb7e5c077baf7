//! IPv6 suffix decoding
//!
//! Decodes the identifier of a splice rule into a 16-byte buffer whose low
//! bytes are overlaid onto a candidate's host bits.
//!
//! - Without `::` the hextets are right-aligned: `781d` occupies only the last
//!   16 bits, everything before it is zero.
//! - With `::` the usual IPv6 expansion applies: the left group fills from
//!   hextet 0, the right group ends at hextet 7, the gap is zero.

use crate::error::SuffixError;

const HEXTETS: usize = 8;

/// Decode `identifier` into a big-endian 16-byte suffix buffer
///
/// An empty identifier yields all zeros.
pub fn parse_suffix(identifier: &str) -> Result<[u8; 16], SuffixError> {
    let mut hextets = [0u16; HEXTETS];

    if !identifier.is_empty() {
        match identifier.split_once("::") {
            Some((left, right)) => {
                let left = split_group(left);
                let right = split_group(right);
                if left.len() + right.len() > HEXTETS {
                    return Err(SuffixError::TooManyHextets(left.len() + right.len()));
                }
                for (slot, token) in hextets.iter_mut().zip(&left) {
                    *slot = parse_hextet(token)?;
                }
                let start = HEXTETS - right.len();
                for (slot, token) in hextets[start..].iter_mut().zip(&right) {
                    *slot = parse_hextet(token)?;
                }
            }
            None => {
                let tokens: Vec<&str> = identifier.split(':').collect();
                if tokens.len() > HEXTETS {
                    return Err(SuffixError::TooManyHextets(tokens.len()));
                }
                let start = HEXTETS - tokens.len();
                for (slot, token) in hextets[start..].iter_mut().zip(&tokens) {
                    *slot = parse_hextet(token)?;
                }
            }
        }
    }

    let mut bytes = [0u8; 16];
    for (chunk, hextet) in bytes.chunks_exact_mut(2).zip(hextets) {
        chunk.copy_from_slice(&hextet.to_be_bytes());
    }
    Ok(bytes)
}

/// Colon-separated tokens of one side of `::` (none for an empty side)
fn split_group(group: &str) -> Vec<&str> {
    if group.is_empty() {
        Vec::new()
    } else {
        group.split(':').collect()
    }
}

fn parse_hextet(token: &str) -> Result<u16, SuffixError> {
    if token.is_empty() {
        return Err(SuffixError::EmptyHextet);
    }
    if token.len() > 4 {
        return Err(SuffixError::HextetTooLong(token.to_string()));
    }
    // from_str_radix accepts a leading '+', which is not a hex digit
    if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SuffixError::InvalidHextet(token.to_string()));
    }
    u16::from_str_radix(token, 16).map_err(|_| SuffixError::InvalidHextet(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn decode(identifier: &str) -> Ipv6Addr {
        Ipv6Addr::from(parse_suffix(identifier).unwrap())
    }

    #[test]
    fn test_empty_identifier_is_zero() {
        assert_eq!(parse_suffix("").unwrap(), [0u8; 16]);
    }

    #[test]
    fn test_short_suffix_is_right_aligned() {
        assert_eq!(decode("781d"), "::781d".parse::<Ipv6Addr>().unwrap());
        assert_eq!(
            decode("9209:d0ff:fe09:781d"),
            "::9209:d0ff:fe09:781d".parse::<Ipv6Addr>().unwrap()
        );
    }

    #[test]
    fn test_full_identifier_round_trips() {
        let full = "2001:db8:1:2:3:4:5:6";
        assert_eq!(decode(full), full.parse::<Ipv6Addr>().unwrap());
    }

    #[test]
    fn test_compressed_notation() {
        assert_eq!(decode("::1"), Ipv6Addr::LOCALHOST);
        assert_eq!(decode("::"), Ipv6Addr::UNSPECIFIED);
        assert_eq!(decode("1::"), "1::".parse::<Ipv6Addr>().unwrap());
        assert_eq!(decode("a:b::c:d"), "a:b::c:d".parse::<Ipv6Addr>().unwrap());
        // `::` standing in for zero hextets
        assert_eq!(decode("1:2:3:4::5:6:7:8"), "1:2:3:4:5:6:7:8".parse::<Ipv6Addr>().unwrap());
    }

    #[test]
    fn test_too_many_hextets() {
        assert_eq!(
            parse_suffix("1:2:3:4:5:6:7:8:9"),
            Err(SuffixError::TooManyHextets(9))
        );
        assert_eq!(
            parse_suffix("1:2:3:4:5::6:7:8:9"),
            Err(SuffixError::TooManyHextets(9))
        );
    }

    #[test]
    fn test_bad_hextets() {
        assert_eq!(parse_suffix("1::2:"), Err(SuffixError::EmptyHextet));
        assert_eq!(parse_suffix(":1"), Err(SuffixError::EmptyHextet));
        assert_eq!(
            parse_suffix("12345"),
            Err(SuffixError::HextetTooLong("12345".to_string()))
        );
        assert_eq!(
            parse_suffix("ghij"),
            Err(SuffixError::InvalidHextet("ghij".to_string()))
        );
        assert_eq!(
            parse_suffix("+1"),
            Err(SuffixError::InvalidHextet("+1".to_string()))
        );
        assert_eq!(
            parse_suffix("::1/64"),
            Err(SuffixError::InvalidHextet("1/64".to_string()))
        );
    }
}
