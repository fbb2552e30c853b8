//! Public, thread-safe entry points for a fludmesh node (spec §4.9,
//! component C9).
//!
//! This is the only crate a host application links against directly: it
//! owns the engine mutex, spawns the engine task, and bridges the radio
//! driver's receive callback into the ingress handler. Everything below it
//! (`flud-core`, `flud-proto`, `flud-storage`, `flud-engine`) has no notion
//! of process lifetime or of "the application".

pub mod callbacks;
pub mod config;
pub mod errors;
pub mod node;

pub use callbacks::CallbackRegistry;
pub use config::NodeConfig;
pub use errors::ApiError;
pub use node::Node;

pub use flud_engine::Notification;
