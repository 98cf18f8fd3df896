//! Network address functions.

use std::net::{IpAddr, Ipv6Addr};

use super::{expect_args, string_arg};
use crate::error::SlaqResult;
use crate::value::Value;

pub fn evaluate(name: &str, args: &[Value]) -> SlaqResult<Option<Value>> {
    match name {
        "IS_PRIVATE_IP" => {
            expect_args(name, args, 1)?;
            let s = string_arg(name, args, 0)?;
            Ok(Some(Value::Boolean(is_private(s))))
        }
        "COUNTRY" => {
            expect_args(name, args, 1)?;
            let s = string_arg(name, args, 0)?;
            Ok(Some(Value::String(country_of(s).to_string())))
        }
        _ => Ok(None),
    }
}

/// Unparseable addresses are not private rather than an error; log data is
/// messy and a filter should keep working across it.
fn is_private(addr: &str) -> bool {
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        Ok(IpAddr::V6(v6)) => v6.is_loopback() || is_unique_local(&v6) || is_unicast_link_local(&v6),
        Err(_) => false,
    }
}

// fc00::/7
fn is_unique_local(addr: &Ipv6Addr) -> bool {
    addr.segments()[0] & 0xfe00 == 0xfc00
}

// fe80::/10
fn is_unicast_link_local(addr: &Ipv6Addr) -> bool {
    addr.segments()[0] & 0xffc0 == 0xfe80
}

/// Best-effort region bucketing by first IPv4 octet. This is a coarse
/// heuristic over historical allocation blocks, not a geolocation lookup.
fn country_of(addr: &str) -> &'static str {
    let parsed = match addr.parse::<IpAddr>() {
        Ok(ip) => ip,
        Err(_) => return "unknown",
    };
    if is_private(addr) {
        return "local";
    }
    match parsed {
        IpAddr::V4(v4) => match v4.octets()[0] {
            1..=60 | 128..=176 | 192..=199 => "north-america",
            61..=99 | 212..=217 => "europe",
            100..=126 | 202..=211 | 218..=223 => "asia-pacific",
            177..=191 => "south-america",
            200..=201 => "africa",
            _ => "unknown",
        },
        IpAddr::V6(_) => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn test_private_ipv4() {
        assert_eq!(
            evaluate("IS_PRIVATE_IP", &[s("192.168.1.5")]).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            evaluate("IS_PRIVATE_IP", &[s("10.0.0.1")]).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            evaluate("IS_PRIVATE_IP", &[s("127.0.0.1")]).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            evaluate("IS_PRIVATE_IP", &[s("8.8.8.8")]).unwrap(),
            Some(Value::Boolean(false))
        );
    }

    #[test]
    fn test_private_ipv6() {
        assert_eq!(
            evaluate("IS_PRIVATE_IP", &[s("::1")]).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            evaluate("IS_PRIVATE_IP", &[s("fd12:3456::1")]).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            evaluate("IS_PRIVATE_IP", &[s("2001:4860:4860::8888")]).unwrap(),
            Some(Value::Boolean(false))
        );
    }

    #[test]
    fn test_unparseable_is_not_private() {
        assert_eq!(
            evaluate("IS_PRIVATE_IP", &[s("not-an-ip")]).unwrap(),
            Some(Value::Boolean(false))
        );
    }

    #[test]
    fn test_country_buckets() {
        assert_eq!(
            evaluate("COUNTRY", &[s("192.168.1.5")]).unwrap(),
            Some(s("local"))
        );
        assert_eq!(
            evaluate("COUNTRY", &[s("garbage")]).unwrap(),
            Some(s("unknown"))
        );
        assert_eq!(
            evaluate("COUNTRY", &[s("85.14.2.1")]).unwrap(),
            Some(s("europe"))
        );
    }

    #[test]
    fn test_requires_string() {
        assert!(evaluate("COUNTRY", &[Value::Integer(1)]).is_err());
        assert!(evaluate("IS_PRIVATE_IP", &[]).is_err());
    }
}
