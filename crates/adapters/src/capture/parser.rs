use pnet::packet::Packet;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::udp::UdpPacket;

/// Addresses and ports of one parsed IPv4/UDP datagram (host byte order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpDatagram {
    pub src_addr: u32,
    pub dst_addr: u32,
    pub src_port: u16,
    pub dst_port: u16,
}

/// Parse an Ethernet frame down to its UDP header. Returns `None` for
/// anything that is not a well-formed IPv4 datagram carrying UDP.
pub fn parse_frame(frame: &[u8]) -> Option<UdpDatagram> {
    let ethernet = EthernetPacket::new(frame)?;
    if ethernet.get_ethertype() != EtherTypes::Ipv4 {
        return None;
    }
    parse_ipv4(ethernet.payload())
}

/// Parse starting at the IPv4 header (for cooked/raw captures without a
/// link-layer header).
pub fn parse_ipv4(datagram: &[u8]) -> Option<UdpDatagram> {
    let ip = Ipv4Packet::new(datagram)?;
    if ip.get_version() != 4 || ip.get_next_level_protocol() != IpNextHeaderProtocols::Udp {
        return None;
    }
    let udp = UdpPacket::new(ip.payload())?;
    Some(UdpDatagram {
        src_addr: u32::from(ip.get_source()),
        dst_addr: u32::from(ip.get_destination()),
        src_port: udp.get_source(),
        dst_port: udp.get_destination(),
    })
}

/// Coarse pre-filter applied before the firewall sees a datagram.
///
/// Low ports carry services like DNS that must never feed the ban logic,
/// and the ignored destination ports exempt protocols such as RDP. This is
/// capture-side policy, not detection policy.
#[derive(Debug, Clone)]
pub struct Prefilter {
    min_port: u16,
    ignored_dst_ports: Vec<u16>,
}

impl Prefilter {
    pub fn new(min_port: u16, ignored_dst_ports: Vec<u16>) -> Self {
        Self {
            min_port,
            ignored_dst_ports,
        }
    }

    pub fn accepts(&self, datagram: &UdpDatagram) -> bool {
        datagram.src_port >= self.min_port
            && datagram.dst_port >= self.min_port
            && !self.ignored_dst_ports.contains(&datagram.dst_port)
    }
}

impl Default for Prefilter {
    /// Ports below 1024 and RDP (3389) are exempt.
    fn default() -> Self {
        Self::new(1024, vec![3389])
    }
}
