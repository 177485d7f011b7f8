//! Internal address utilities.

use std::net::Ipv4Addr;

/// Returns true when `addr` is a syntactically valid dotted-quad IPv4
/// address.
pub fn is_ipv4(addr: &str) -> bool {
    addr.parse::<Ipv4Addr>().is_ok()
}

/// Translate a dotted-quad address into its reverse-lookup coordinates:
/// the record label and the owning `in-addr.arpa` zone.
///
/// `10.20.30.40` maps to `("40", "30.20.10.in-addr.arpa")`.
pub fn ip_to_arpa(addr: &str) -> Option<(String, String)> {
    let ip: Ipv4Addr = addr.parse().ok()?;
    let octets = ip.octets();
    Some((
        octets[3].to_string(),
        format!("{}.{}.{}.in-addr.arpa", octets[2], octets[1], octets[0]),
    ))
}
