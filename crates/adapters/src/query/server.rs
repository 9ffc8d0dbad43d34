use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use application::guard_service_impl::GuardAppService;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Loopback liveness-query service.
///
/// Protocol: a 4-byte big-endian IPv4 address in, a single byte out —
/// 1 when the firewall currently tracks live traffic from that address,
/// 0 otherwise. Datagrams of any other length are ignored.
pub async fn run_query_service(
    port: u16,
    service: Arc<Mutex<GuardAppService>>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, port)).await?;
    info!(port, "query service listening");

    let mut buf = [0u8; 16];
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(%err, "query receive failed");
                        continue;
                    }
                };
                let Some(addr) = decode_query(&buf[..len]) else {
                    continue;
                };
                let active = service.lock().unwrap().handle_query(addr);
                if let Err(err) = socket.send_to(&[u8::from(active)], peer).await {
                    warn!(%err, "query reply failed");
                }
            }
        }
    }
}

/// Decode a query datagram: exactly four bytes, big-endian address.
fn decode_query(payload: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = payload.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_four_byte_address() {
        assert_eq!(decode_query(&[1, 2, 3, 4]), Some(0x0102_0304));
        assert_eq!(decode_query(&[0, 0, 0, 0]), Some(0));
    }

    #[test]
    fn rejects_other_lengths() {
        assert_eq!(decode_query(&[]), None);
        assert_eq!(decode_query(&[1, 2, 3]), None);
        assert_eq!(decode_query(&[1, 2, 3, 4, 5]), None);
    }
}
