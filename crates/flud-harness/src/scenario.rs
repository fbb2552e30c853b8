//! Scenario-building helpers: wire a handful of [`flud_api::Node`]s to a
//! shared [`Medium`], the harness's equivalent of the teacher's `cluster`
//! module (a topology of mesh nodes instead of a room of MLS clients).
#![allow(clippy::expect_used, reason = "harness setup failures are infrastructure bugs, not part of the scenario under test")]

use std::sync::Arc;

use flud_api::{Node, NodeConfig};
use flud_proto::MacAddr;

use crate::medium::Medium;
use crate::sim_env::{SimClock, SimEnv};

/// One simulated node plus the on-disk context kept alive for its whole
/// lifetime.
pub struct SimNode {
    /// The node under test.
    pub node: Arc<Node<SimEnv>>,
    /// This node's own MAC address, for convenience in assertions.
    pub mac: MacAddr,
    context: tempfile::TempDir,
}

impl SimNode {
    /// This node's on-disk context directory.
    #[must_use]
    pub fn context_path(&self) -> &std::path::Path {
        self.context.path()
    }
}

/// Build one simulated node named `name`, registered on `medium` under
/// `mac`, sharing `clock` with the rest of the scenario, and wire its
/// radio receive path so frames the medium delivers reach
/// [`Node::on_receive`] automatically.
///
/// # Panics
///
/// If the on-disk context cannot be created or `init` rejects the default
/// config. Both indicate a harness bug, not fludmesh behaviour under test.
#[must_use]
pub fn spawn_node(name: &str, mac: MacAddr, clock: &SimClock, medium: &Arc<Medium>, seed: u64) -> SimNode {
    let context = tempfile::tempdir().expect("tempdir");
    let env = SimEnv::new(mac, clock.clone(), medium.clone(), seed);
    let config = NodeConfig::new(name, context.path());
    let node = Arc::new(Node::init(env, mac, config).expect("init"));

    let callback_node = node.clone();
    medium.register(
        mac,
        Arc::new(move |bytes: &[u8], src_mac: MacAddr, rssi: i8| {
            callback_node.on_receive(bytes, src_mac, rssi);
        }),
    );

    SimNode { node, mac, context }
}

/// Build a fully-connected, lossless two-node scenario: `mac(1)` named
/// `"Alpha"` and `mac(2)` named `"Beta"`, each reachable from the other at
/// `-40` dBm.
#[must_use]
pub fn two_node_cluster() -> (SimClock, Arc<Medium>, SimNode, SimNode) {
    let clock = SimClock::new();
    let medium = Arc::new(Medium::new(1));
    let mac_a = MacAddr::new([1, 0, 0, 0, 0, 0]);
    let mac_b = MacAddr::new([2, 0, 0, 0, 0, 0]);
    medium.link(mac_a, mac_b, -40, 0.0);
    let a = spawn_node("Alpha", mac_a, &clock, &medium, 11);
    let b = spawn_node("Beta", mac_b, &clock, &medium, 22);
    (clock, medium, a, b)
}
