//! Encoding and decoding of passive-mode addresses.
//!
//! Legacy form (RFC 959, reply 227): `h1,h2,h3,h4,p1,p2` with
//! `port = p1 * 256 + p2`.
//! Extended form (RFC 2428, reply 229): `(|||port|)`, the host being the one
//! the control connection already talks to.

use crate::core_protocol::error::PassiveReplyError;
use regex::Regex;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::OnceLock;

fn pasv_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Exactly six numbers: no digit or comma may touch either end.
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|[^\d,])(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3})(?:[^\d,]|$)",
        )
        .expect("PASV pattern is valid")
    })
}

fn epsv_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(([!-~])([!-~])([!-~])(\d{1,5})([!-~])\)").expect("EPSV pattern is valid")
    })
}

/// Text of a 227 reply advertising `ip:port`.
pub fn encode_pasv(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!(
        "Entering Passive Mode ({},{},{},{},{},{}).",
        h1,
        h2,
        h3,
        h4,
        port / 256,
        port % 256
    )
}

/// Text of a 229 reply advertising `port`.
pub fn encode_epsv(port: u16) -> String {
    format!("Entering Extended Passive Mode (|||{}|)", port)
}

/// Extracts the data address from the text of a 227 reply.
///
/// The six numbers are searched anywhere in the text: servers disagree on
/// whether they are wrapped in parentheses.
pub fn decode_pasv(text: &str) -> Result<SocketAddrV4, PassiveReplyError> {
    let caps = pasv_regex()
        .captures(text)
        .ok_or_else(|| PassiveReplyError::MissingAddress(text.to_string()))?;

    let mut numbers = [0u8; 6];
    for (slot, value) in numbers.iter_mut().zip(caps.iter().skip(1)) {
        let value = value.map(|m| m.as_str()).unwrap_or_default();
        *slot = value
            .parse::<u8>()
            .map_err(|_| PassiveReplyError::InvalidNumber(value.to_string()))?;
    }

    let [h1, h2, h3, h4, p1, p2] = numbers;
    let port = u16::from(p1) * 256 + u16::from(p2);
    Ok(SocketAddrV4::new(Ipv4Addr::new(h1, h2, h3, h4), port))
}

/// Extracts the port from the text of a 229 reply.
pub fn decode_epsv(text: &str) -> Result<u16, PassiveReplyError> {
    let caps = epsv_regex()
        .captures(text)
        .ok_or_else(|| PassiveReplyError::MalformedExtended(text.to_string()))?;

    let delims = [&caps[1], &caps[2], &caps[3], &caps[5]];
    let delim = delims[0];
    if delims.iter().any(|d| *d != delim) || delim.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PassiveReplyError::MalformedExtended(text.to_string()));
    }

    caps[4]
        .parse::<u16>()
        .map_err(|_| PassiveReplyError::InvalidNumber(caps[4].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundary_ports() {
        let host = Ipv4Addr::new(127, 0, 0, 1);
        for port in [0u16, 1, 255, 256, 257, 1024, 65535] {
            let text = encode_pasv(host, port);
            assert_eq!(decode_pasv(&text).unwrap(), SocketAddrV4::new(host, port));
            assert_eq!(decode_epsv(&encode_epsv(port)).unwrap(), port);
        }
    }

    #[test]
    fn test_legacy_byte_split() {
        assert_eq!(
            encode_pasv(Ipv4Addr::new(10, 0, 0, 7), 256),
            "Entering Passive Mode (10,0,0,7,1,0)."
        );
        assert_eq!(
            encode_pasv(Ipv4Addr::new(10, 0, 0, 7), 65535),
            "Entering Passive Mode (10,0,0,7,255,255)."
        );
    }

    #[test]
    fn test_decode_without_parentheses() {
        let addr = decode_pasv("Entering Passive Mode 192,168,1,2,19,137").unwrap();
        assert_eq!(addr, SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 2), 19 * 256 + 137));
        let addr = decode_pasv("192,168,1,2,0,21").unwrap();
        assert_eq!(addr, SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 2), 21));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_pasv("Entering Passive Mode"),
            Err(PassiveReplyError::MissingAddress(_))
        ));
        assert!(matches!(
            decode_pasv("(300,1,1,1,1,1)"),
            Err(PassiveReplyError::InvalidNumber(_))
        ));
        for text in [
            "Entering Passive Mode (1234,1,1,1,1,1).",
            "Entering Passive Mode (1234,1,1,1,1,1,1).",
            "Entering Passive Mode (1,1,1,1,1,1234).",
            "Entering Passive Mode (1,1,1,1,1,1,1).",
        ] {
            assert!(
                matches!(decode_pasv(text), Err(PassiveReplyError::MissingAddress(_))),
                "{}",
                text
            );
        }
        assert!(matches!(
            decode_epsv("Entering Extended Passive Mode (|||70000|)"),
            Err(PassiveReplyError::InvalidNumber(_))
        ));
        assert!(matches!(
            decode_epsv("Entering Extended Passive Mode (||!6446|)"),
            Err(PassiveReplyError::MalformedExtended(_))
        ));
        assert!(matches!(
            decode_epsv("no tuple here"),
            Err(PassiveReplyError::MalformedExtended(_))
        ));
    }

    #[test]
    fn test_decode_epsv_other_delimiter() {
        assert_eq!(decode_epsv("Entering Extended Passive Mode (!!!6446!)").unwrap(), 6446);
    }

    proptest! {
        #[test]
        fn prop_pasv_round_trip(a: u8, b: u8, c: u8, d: u8, port: u16) {
            let host = Ipv4Addr::new(a, b, c, d);
            let decoded = decode_pasv(&encode_pasv(host, port)).unwrap();
            prop_assert_eq!(decoded, SocketAddrV4::new(host, port));
            prop_assert_eq!(u32::from(port / 256) * 256 + u32::from(port % 256), u32::from(port));
        }

        #[test]
        fn prop_epsv_round_trip(port: u16) {
            prop_assert_eq!(decode_epsv(&encode_epsv(port)).unwrap(), port);
        }
    }
}
