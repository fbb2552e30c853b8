//! Deterministic multi-node simulation harness for fludmesh (spec §8):
//! wires a handful of [`flud_api::Node`]s to a shared in-memory [`Medium`]
//! and drives end-to-end scenarios without real radio hardware.
//!
//! Generalizes the teacher's turmoil-backed cluster simulation from "a room
//! of MLS clients" to "a topology of mesh nodes": [`Medium`] stands in for
//! the transport, [`SimEnv`] for the per-node environment, and
//! [`scenario::spawn_node`] for cluster bring-up.

pub mod medium;
pub mod scenario;
pub mod sim_env;

pub use medium::Medium;
pub use scenario::{spawn_node, two_node_cluster, SimNode};
pub use sim_env::{SimClock, SimEnv};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use flud_proto::{Body, Capabilities, ContentType, Frame, FrameFlags, FrameHeader, FrameType, HelloBody, MacAddr, Role};
    use flud_storage::MessageStatus;

    use super::*;

    fn settle() {
        std::thread::sleep(Duration::from_millis(150));
    }

    #[test]
    fn hello_round_trip_registers_the_peer_both_ways() {
        let (_clock, _medium, a, b) = two_node_cluster();
        a.node.start().expect("start a");
        b.node.start().expect("start b");
        settle();

        let mut seen_by_b = Vec::new();
        b.node
            .enum_devices(|mac, record| {
                seen_by_b.push((mac, record.name.clone()));
                true
            })
            .expect("enum_devices on b");
        assert_eq!(seen_by_b, vec![(a.mac, "Alpha".to_string())]);

        let mut seen_by_a = Vec::new();
        a.node
            .enum_devices(|mac, record| {
                seen_by_a.push((mac, record.name.clone()));
                true
            })
            .expect("enum_devices on a");
        assert_eq!(seen_by_a, vec![(b.mac, "Beta".to_string())]);

        a.node.stop().expect("stop a");
        b.node.stop().expect("stop b");
    }

    #[test]
    fn private_message_is_delivered_and_acked() {
        let (_clock, _medium, a, b) = two_node_cluster();
        a.node.start().expect("start a");
        b.node.start().expect("start b");
        settle();

        let message_id = a.node.send_private_message(b.mac, b"hello beta", ContentType::TEXT).expect("send");
        settle();

        let a_records = a.node.load_peer_messages(b.mac, 0, 10).expect("load on a");
        assert_eq!(a_records.len(), 1);
        assert_eq!(a_records[0].status, MessageStatus::Delivered);
        assert_eq!(message_id, 0);

        let b_records = b.node.load_peer_messages(a.mac, 0, 10).expect("load on b");
        assert_eq!(b_records.len(), 1);
        assert_eq!(b_records[0].status, MessageStatus::Received);
        assert_eq!(b_records[0].payload, b"hello beta");

        a.node.stop().expect("stop a");
        b.node.stop().expect("stop b");
    }

    #[test]
    fn channel_message_reaches_every_subscriber_and_paginates() {
        let (_clock, _medium, a, b) = two_node_cluster();
        a.node.add_channel("general").expect("add_channel a");
        b.node.add_channel("general").expect("add_channel b");
        a.node.start().expect("start a");
        b.node.start().expect("start b");
        settle();

        a.node.send_channel_message("general", b"first", ContentType::TEXT).expect("send first");
        a.node.send_channel_message("general", b"second", ContentType::TEXT).expect("send second");
        settle();

        let count = b.node.get_channel_message_count("general").expect("count");
        assert_eq!(count, 2);

        let page = b.node.load_channel_messages("general", 0, 1).expect("page");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].payload, b"first");

        b.node.mark_channel_read("general");

        a.node.stop().expect("stop a");
        b.node.stop().expect("stop b");
    }

    #[test]
    fn duplicate_frame_delivered_twice_is_suppressed_on_second_delivery() {
        let (_clock, _medium, _a, b) = two_node_cluster();
        let sender = MacAddr::new([9, 0, 0, 0, 0, 0]);

        let header = FrameHeader::new(FrameType::Hello, FrameFlags::BROADCAST, 5, 1, sender, MacAddr::BROADCAST);
        let frame = Frame {
            header,
            body: Body::Hello(HelloBody {
                name: "Stranger".to_string(),
                role: Role::Client,
                capabilities: Capabilities::empty(),
                battery: 90,
            }),
        };
        let bytes = frame.encode().expect("encode");

        b.node.on_receive(&bytes, sender, -40);
        b.node.on_receive(&bytes, sender, -40);

        let mut seen = 0;
        b.node
            .enum_devices(|mac, _| {
                if mac == sender {
                    seen += 1;
                }
                true
            })
            .expect("enum_devices");
        assert_eq!(seen, 1);
    }

    #[test]
    fn unacknowledged_private_message_eventually_fails_after_retries() {
        let clock = SimClock::new();
        let medium = Arc::new(Medium::new(3));
        let mac_a = MacAddr::new([5, 0, 0, 0, 0, 0]);
        let mac_b = MacAddr::new([6, 0, 0, 0, 0, 0]);
        // Total loss from the start: b never sees the frame at all, so a's
        // send retries against silence until it exhausts MAX_TRIES.
        medium.link(mac_a, mac_b, -40, 1.0);
        let a = spawn_node("Gamma", mac_a, &clock, &medium, 51);
        let b = spawn_node("Delta", mac_b, &clock, &medium, 52);

        a.node.start().expect("start a");
        b.node.start().expect("start b");

        a.node.send_private_message(mac_b, b"no ack", ContentType::TEXT).expect("send");
        settle();

        for _ in 0..=flud_engine::MAX_TRIES {
            clock.advance(flud_engine::ACK_TIMEOUT_MS + 10);
            std::thread::sleep(Duration::from_millis(1200));
        }

        let records = a.node.load_peer_messages(mac_b, 0, 10).expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, MessageStatus::DeliveryFailed);

        a.node.stop().expect("stop a");
        b.node.stop().expect("stop b");
    }
}
