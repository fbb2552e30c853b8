//! UDP-broadcast radio stand-in (spec §6, "Radio driver contract"): sends
//! fludmesh frames as UDP broadcast datagrams on a fixed port instead of
//! over real radio hardware, for manually exercising a node on one machine
//! or one LAN segment.
#![allow(clippy::expect_used, reason = "system RNG failure leaves nothing sensible to do but abort")]

use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Instant;

use flud_core::{radio_send_error, Clock, Radio, Result as CoreResult, Rng};

/// Default broadcast port demo nodes exchange frames on.
pub const DEFAULT_PORT: u16 = 47_100;

/// Datagrams larger than this are truncated by the OS anyway; comfortably
/// above [`flud_proto::RADIO_MTU`].
const RECV_BUF_LEN: usize = 512;

/// A [`flud_core::Environment`]'s `Clock` + `Rng` + `Radio` implementation
/// over a UDP broadcast socket.
///
/// `now_ms` measures elapsed time since this radio was bound rather than
/// wall-clock time, matching the `Clock` contract's "since some fixed but
/// arbitrary epoch" wording.
#[derive(Clone)]
pub struct UdpRadio {
    socket: Arc<UdpSocket>,
    port: u16,
    start: Instant,
}

impl UdpRadio {
    /// Bind a broadcast-capable UDP socket on `port`.
    ///
    /// # Errors
    ///
    /// Any `std::io::Error` the bind or `set_broadcast` calls report.
    pub fn bind(port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_broadcast(true)?;
        Ok(Self { socket: Arc::new(socket), port, start: Instant::now() })
    }

    /// Spawn a dedicated thread that blocks on `recv_from` and calls
    /// `deliver` with each datagram's bytes. Runs until the socket errors,
    /// which in practice only happens if it is closed out from under this
    /// radio.
    pub fn spawn_receive_loop(&self, deliver: impl Fn(&[u8]) + Send + 'static) {
        let socket = self.socket.clone();
        std::thread::spawn(move || {
            let mut buf = [0u8; RECV_BUF_LEN];
            loop {
                match socket.recv_from(&mut buf) {
                    Ok((len, _src)) => deliver(&buf[..len]),
                    Err(err) => {
                        tracing::warn!(error = %err, "udp radio recv failed; receive thread exiting");
                        break;
                    }
                }
            }
        });
    }
}

impl Clock for UdpRadio {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

impl Rng for UdpRadio {
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        getrandom::fill(&mut bytes).expect("system RNG unavailable");
        u32::from_ne_bytes(bytes)
    }
}

impl Radio for UdpRadio {
    fn send_broadcast(&self, bytes: &[u8]) -> CoreResult<()> {
        self.socket
            .send_to(bytes, ("255.255.255.255", self.port))
            .map(|_| ())
            .map_err(|err| radio_send_error(err.to_string()))
    }
}
