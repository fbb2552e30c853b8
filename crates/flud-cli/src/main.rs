//! fludmesh demo binary.
//!
//! Boots one node against a real on-disk context directory and a UDP
//! broadcast radio stand-in, for manually exercising the public API from a
//! terminal. Not a production radio driver: UDP broadcast is a loopback/LAN
//! stand-in for the real ESP-NOW-style hardware spec §1 targets.
//!
//! # Usage
//!
//! ```bash
//! flud-cli --name Alpha --mac 01:00:00:00:00:01 --context /tmp/alpha
//! ```

mod udp_radio;

use std::path::PathBuf;

use clap::Parser;
use flud_proto::{ContentType, MacAddr};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flud_api::{Node, NodeConfig};
use udp_radio::UdpRadio;

/// fludmesh demo node
#[derive(Parser, Debug)]
#[command(name = "flud-cli")]
#[command(about = "Boots one fludmesh node over a UDP broadcast radio stand-in")]
#[command(version)]
struct Args {
    /// Device name carried in this node's HELLO frames.
    #[arg(short, long)]
    name: String,

    /// This node's own hardware address, e.g. `01:00:00:00:00:01`.
    #[arg(long)]
    mac: MacAddr,

    /// On-disk context directory (created if missing).
    #[arg(long)]
    context: PathBuf,

    /// UDP broadcast port every node on the same demo shares.
    #[arg(long, default_value_t = udp_radio::DEFAULT_PORT)]
    port: u16,

    /// Radio channel number, 0..=14.
    #[arg(long, default_value_t = 1)]
    channel: u8,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(name = %args.name, mac = %args.mac, "fludmesh node starting");

    let radio = UdpRadio::bind(args.port)?;

    let mut config = NodeConfig::new(args.name, args.context);
    config.channel = args.channel;
    let node = std::sync::Arc::new(Node::init(radio.clone(), args.mac, config)?);

    let receive_node = node.clone();
    radio.spawn_receive_loop(move |bytes| {
        let src_mac = flud_proto::Frame::decode(bytes).map_or(MacAddr::BROADCAST, |frame| frame.header.source_mac());
        receive_node.on_receive(bytes, src_mac, 0);
    });

    node.register_callback(move |event| {
        tracing::info!(?event, "notification");
        if let flud_api::Notification::Message { sender, payload, .. } = &event {
            if let Ok(text) = std::str::from_utf8(payload) {
                tracing::info!(from = %sender, text, "message received");
            }
        }
    });

    node.start()?;
    tracing::info!("node running; broadcasting HELLO on port {}", args.port);

    node.send_hello()?;

    let mut line = String::new();
    loop {
        line.clear();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        node.send_channel_message("general", trimmed.as_bytes(), ContentType::TEXT)?;
    }

    node.stop()?;
    Ok(())
}
