use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pnet::datalink::{self, Channel, NetworkInterface};
use tracing::{debug, warn};

use super::parser::{Prefilter, parse_frame};

/// How long a blocked read may wait before the shutdown flag is re-checked.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Return the non-loopback interfaces selected by `names` (all of them when
/// `names` is empty).
pub fn select_interfaces(names: &[String]) -> Vec<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter(|iface| names.is_empty() || names.iter().any(|name| name == &iface.name))
        .collect()
}

/// IPv4 addresses assigned to an interface (host byte order).
pub fn interface_addresses(iface: &NetworkInterface) -> Vec<u32> {
    iface
        .ips
        .iter()
        .filter_map(|net| match net.ip() {
            std::net::IpAddr::V4(v4) => Some(u32::from(v4)),
            std::net::IpAddr::V6(_) => None,
        })
        .collect()
}

/// Capture loop for one interface.
///
/// Every frame that parses as IPv4/UDP and passes the pre-filter hands its
/// source address and source port to `deliver`. Returns once `shutdown` is
/// set (reads wake up at least every `READ_TIMEOUT`), or with the first
/// unrecoverable channel error.
pub fn run_capture(
    interface: &NetworkInterface,
    prefilter: &Prefilter,
    shutdown: &AtomicBool,
    mut deliver: impl FnMut(u32, u16),
) -> io::Result<()> {
    let config = datalink::Config {
        read_timeout: Some(READ_TIMEOUT),
        ..Default::default()
    };
    let mut rx = match datalink::channel(interface, config)? {
        Channel::Ethernet(_tx, rx) => rx,
        _ => return Err(io::Error::other("unsupported datalink channel type")),
    };

    while !shutdown.load(Ordering::Relaxed) {
        match rx.next() {
            Ok(frame) => {
                let Some(datagram) = parse_frame(frame) else {
                    continue;
                };
                if !prefilter.accepts(&datagram) {
                    continue;
                }
                deliver(datagram.src_addr, datagram.src_port);
            }
            Err(err)
                if err.kind() == io::ErrorKind::TimedOut
                    || err.kind() == io::ErrorKind::WouldBlock =>
            {
                continue;
            }
            Err(err) => {
                warn!(interface = %interface.name, %err, "capture read failed");
                return Err(err);
            }
        }
    }
    debug!(interface = %interface.name, "capture loop stopped");
    Ok(())
}
