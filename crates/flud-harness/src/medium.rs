//! In-memory broadcast medium connecting simulated radios (spec §6, "Radio
//! driver contract"), generalizing the teacher's virtual-network simulation
//! from per-connection transport to a shared lossy broadcast channel.
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use flud_proto::MacAddr;
use rand::{Rng as _, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Callback a node registers to receive frames addressed to it. Invoked
/// synchronously, on the sending node's own thread.
pub type DeliverFn = Arc<dyn Fn(&[u8], MacAddr, i8) + Send + Sync>;

struct Link {
    rssi: i8,
    loss_probability: f64,
}

struct MediumInner {
    endpoints: HashMap<MacAddr, DeliverFn>,
    links: HashMap<(MacAddr, MacAddr), Link>,
    rng: ChaCha8Rng,
}

/// Shared broadcast medium: a node can reach every other node it has an
/// explicit [`Self::link`] to, subject to that link's loss probability
/// (spec §1: "lossy radio").
///
/// Nodes with no declared link cannot hear each other at all, modelling
/// topology; a declared link with a non-zero loss probability models a
/// flaky but reachable neighbour.
pub struct Medium {
    inner: Mutex<MediumInner>,
}

impl Medium {
    /// Build an empty medium, seeded for reproducible loss draws.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(MediumInner {
                endpoints: HashMap::new(),
                links: HashMap::new(),
                rng: ChaCha8Rng::seed_from_u64(seed),
            }),
        }
    }

    /// Register a node's receive callback under its MAC address.
    pub fn register(&self, mac: MacAddr, deliver: DeliverFn) {
        self.inner.lock().expect("medium mutex poisoned").endpoints.insert(mac, deliver);
    }

    /// Declare a bidirectional link between `a` and `b`. `rssi` is the
    /// signal strength each side reports for the other; `loss_probability`
    /// is drawn independently for every broadcast (`0.0` never drops,
    /// `1.0` always drops).
    pub fn link(&self, a: MacAddr, b: MacAddr, rssi: i8, loss_probability: f64) {
        let mut inner = self.inner.lock().expect("medium mutex poisoned");
        inner.links.insert((a, b), Link { rssi, loss_probability });
        inner.links.insert((b, a), Link { rssi, loss_probability });
    }

    /// Broadcast `bytes` from `source` to every linked, still-registered
    /// neighbour, dropping per-link according to that link's loss
    /// probability.
    ///
    /// Delivery callbacks run after the medium's internal lock is released,
    /// so a node that forwards or ACKs inline from its receive callback
    /// cannot deadlock against a concurrent broadcast.
    pub fn broadcast(&self, source: MacAddr, bytes: &[u8]) {
        let mut inner = self.inner.lock().expect("medium mutex poisoned");
        let neighbor_macs: Vec<MacAddr> =
            inner.links.keys().filter(|(from, _)| *from == source).map(|(_, to)| *to).collect();

        let mut deliveries: Vec<(DeliverFn, i8)> = Vec::new();
        for to in neighbor_macs {
            let link = inner.links.get(&(source, to)).expect("link exists");
            let rssi = link.rssi;
            let dropped = link.loss_probability > 0.0 && inner.rng.gen::<f64>() < link.loss_probability;
            if dropped {
                continue;
            }
            if let Some(deliver) = inner.endpoints.get(&to) {
                deliveries.push((deliver.clone(), rssi));
            }
        }
        drop(inner);

        for (deliver, rssi) in deliveries {
            deliver(bytes, source, rssi);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn mac(n: u8) -> MacAddr {
        MacAddr::new([n, 0, 0, 0, 0, 0])
    }

    #[test]
    fn unlinked_nodes_cannot_hear_each_other() {
        let medium = Medium::new(1);
        let received = Arc::new(AtomicUsize::new(0));
        let received2 = received.clone();
        medium.register(mac(2), Arc::new(move |_, _, _| { received2.fetch_add(1, Ordering::Relaxed); }));

        medium.broadcast(mac(1), b"hello");

        assert_eq!(received.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn linked_node_receives_broadcast() {
        let medium = Medium::new(1);
        let received = Arc::new(Mutex::new(Vec::new()));
        let received2 = received.clone();
        medium.link(mac(1), mac(2), -50, 0.0);
        medium.register(mac(2), Arc::new(move |bytes: &[u8], src, rssi| {
            received2.lock().expect("mutex").push((bytes.to_vec(), src, rssi));
        }));

        medium.broadcast(mac(1), b"hello");

        let received = received.lock().expect("mutex");
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], (b"hello".to_vec(), mac(1), -50));
    }

    #[test]
    fn a_link_with_total_loss_never_delivers() {
        let medium = Medium::new(7);
        let received = Arc::new(AtomicUsize::new(0));
        let received2 = received.clone();
        medium.link(mac(1), mac(2), -50, 1.0);
        medium.register(mac(2), Arc::new(move |_, _, _| { received2.fetch_add(1, Ordering::Relaxed); }));

        for _ in 0..20 {
            medium.broadcast(mac(1), b"hello");
        }

        assert_eq!(received.load(Ordering::Relaxed), 0);
    }
}
