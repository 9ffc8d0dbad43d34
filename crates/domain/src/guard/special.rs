/// Addresses the firewall refuses to track.
///
/// Covers "this network", RFC1918 private space, CGNAT, loopback,
/// link-local, documentation/benchmarking blocks, the 6to4 relay prefix,
/// and everything from multicast upward. Traffic from these sources is
/// either local, spoofed, or unroutable, so banning them would only poison
/// the ban table.
pub fn is_special_address(addr: u32) -> bool {
    let b1 = (addr >> 24) as u8;
    let b2 = (addr >> 16) as u8;
    let b3 = (addr >> 8) as u8;

    match b1 {
        0 | 10 | 127 => true,
        100 => (64..=127).contains(&b2),          // CGNAT 100.64.0.0/10
        169 => b2 == 254,                         // link-local
        172 => (16..=31).contains(&b2),           // RFC1918 172.16.0.0/12
        192 => {
            (b2 == 0 && (b3 == 0 || b3 == 2))     // 192.0.0.0/24 + TEST-NET-1
                || (b2 == 88 && b3 == 99)         // 6to4 relay anycast
                || b2 == 168                      // RFC1918 192.168.0.0/16
        }
        198 => (18..=19).contains(&b2)            // benchmarking 198.18.0.0/15
            || (b2 == 51 && b3 == 100),           // TEST-NET-2
        203 => b2 == 0 && b3 == 113,              // TEST-NET-3
        _ => b1 >= 224,                           // multicast + reserved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn special(a: u8, b: u8, c: u8, d: u8) -> bool {
        is_special_address(u32::from(Ipv4Addr::new(a, b, c, d)))
    }

    #[test]
    fn whole_first_octet_blocks() {
        assert!(special(0, 1, 2, 3));
        assert!(special(10, 0, 0, 1));
        assert!(special(10, 255, 255, 255));
        assert!(special(127, 0, 0, 1));
        assert!(special(224, 0, 0, 1));
        assert!(special(239, 1, 1, 1));
        assert!(special(255, 255, 255, 255));
    }

    #[test]
    fn cgnat_range() {
        assert!(!special(100, 63, 0, 1));
        assert!(special(100, 64, 0, 1));
        assert!(special(100, 127, 255, 254));
        assert!(!special(100, 128, 0, 1));
    }

    #[test]
    fn link_local() {
        assert!(special(169, 254, 1, 1));
        assert!(!special(169, 253, 1, 1));
        assert!(!special(169, 255, 1, 1));
    }

    #[test]
    fn rfc1918_172_range_is_16_to_31() {
        assert!(!special(172, 15, 0, 1));
        assert!(special(172, 16, 0, 1));
        assert!(special(172, 31, 255, 255));
        assert!(!special(172, 32, 0, 1));
    }

    #[test]
    fn documentation_and_private_192() {
        assert!(special(192, 0, 0, 1));
        assert!(special(192, 0, 2, 1));
        assert!(!special(192, 0, 3, 1));
        assert!(special(192, 88, 99, 1));
        assert!(!special(192, 88, 100, 1));
        assert!(special(192, 168, 0, 1));
        assert!(special(192, 168, 255, 1));
        assert!(!special(192, 169, 0, 1));
    }

    #[test]
    fn benchmarking_and_test_nets() {
        assert!(special(198, 18, 0, 1));
        assert!(special(198, 19, 255, 1));
        assert!(!special(198, 20, 0, 1));
        assert!(special(198, 51, 100, 1));
        assert!(!special(198, 51, 101, 1));
        assert!(special(203, 0, 113, 1));
        assert!(!special(203, 0, 114, 1));
        assert!(!special(203, 1, 113, 1));
    }

    #[test]
    fn ordinary_public_addresses_pass() {
        assert!(!special(1, 1, 1, 1));
        assert!(!special(8, 8, 8, 8));
        assert!(!special(93, 184, 216, 34));
        assert!(!special(172, 0, 0, 1));
        assert!(!special(223, 255, 255, 255));
    }
}
