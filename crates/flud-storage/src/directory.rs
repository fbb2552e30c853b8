//! Peer and channel directory store (spec §4.4, component C4): a persistent
//! on-disk half plus a volatile in-memory half.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use flud_core::{ChannelPersistent, ChannelVolatile, PeerPersistent, PeerVolatile};
use flud_proto::MacAddr;

use crate::errors::Result;

const META_FILE: &str = "meta.bin";

fn peer_dir(ctx: &Path, mac: MacAddr) -> PathBuf {
    ctx.join("devices").join(mac.to_hex())
}

fn channel_dir(ctx: &Path, name: &str) -> PathBuf {
    ctx.join("channels").join(name)
}

/// On-disk path of a peer's private message log (spec §3).
#[must_use]
pub fn peer_log_path(ctx: &Path, mac: MacAddr) -> PathBuf {
    peer_dir(ctx, mac).join("messages.bin")
}

/// On-disk path of a channel's message log (spec §3).
#[must_use]
pub fn channel_log_path(ctx: &Path, name: &str) -> PathBuf {
    channel_dir(ctx, name).join("messages.bin")
}

fn write_record(dir: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(META_FILE), bytes)?;
    Ok(())
}

fn read_record(dir: &Path) -> Option<Vec<u8>> {
    std::fs::read(dir.join(META_FILE)).ok()
}

fn remove_record(dir: &Path) -> Result<()> {
    match std::fs::remove_file(dir.join(META_FILE)) {
        Ok(()) => {},
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => return Err(e.into()),
    }
    // Best-effort: drop the now-empty entity directory. A non-empty
    // directory (e.g. a message log still present) is left alone.
    let _ = std::fs::remove_dir(dir);
    Ok(())
}

/// Persistent + volatile store for peers, rooted at a context path.
#[derive(Debug, Clone)]
pub struct PeerDirectory {
    ctx: PathBuf,
    volatile: HashMap<MacAddr, PeerVolatile>,
}

impl PeerDirectory {
    /// Open (without creating) the directory rooted at `ctx`.
    #[must_use]
    pub fn new(ctx: impl Into<PathBuf>) -> Self {
        Self { ctx: ctx.into(), volatile: HashMap::new() }
    }

    /// Write (or overwrite) the persistent record for `mac`.
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn write_persistent(&self, record: &PeerPersistent) -> Result<()> {
        write_record(&peer_dir(&self.ctx, record.mac), &record.encode())
    }

    /// Read the persistent record for `mac`. A missing or corrupt file is
    /// "not found" (spec invariant 2), not an error.
    #[must_use]
    pub fn read_persistent(&self, mac: MacAddr) -> Option<PeerPersistent> {
        read_record(&peer_dir(&self.ctx, mac)).and_then(|bytes| PeerPersistent::decode(&bytes).ok())
    }

    /// Overwrite-if-present, insert-if-absent on the volatile side.
    pub fn update_volatile(&mut self, mac: MacAddr, record: PeerVolatile) {
        self.volatile.insert(mac, record);
    }

    /// Volatile state for `mac`, `None` if never observed this session.
    /// Peer lookup does not lazy-create (spec §4.4, unlike the channel side).
    #[must_use]
    pub fn get_volatile(&self, mac: MacAddr) -> Option<PeerVolatile> {
        self.volatile.get(&mac).copied()
    }

    /// `(persistent, volatile_or_default)`; absence of the persistent
    /// record is "not found" even if a volatile row exists (spec §4.4).
    #[must_use]
    pub fn find(&self, mac: MacAddr) -> Option<(PeerPersistent, PeerVolatile)> {
        let persistent = self.read_persistent(mac)?;
        let volatile = self.get_volatile(mac).unwrap_or_default();
        Some((persistent, volatile))
    }

    /// Delete the persistent record and drop the volatile row.
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure other than "already absent".
    pub fn remove(&mut self, mac: MacAddr) -> Result<()> {
        remove_record(&peer_dir(&self.ctx, mac))?;
        self.volatile.remove(&mac);
        Ok(())
    }

    /// Walk every on-disk peer whose metadata parses, calling `visit` with
    /// `(mac, persistent)`. Stops early if `visit` returns `false`.
    ///
    /// # Errors
    ///
    /// `Io` if the devices directory exists but cannot be read.
    pub fn enumerate(&self, mut visit: impl FnMut(MacAddr, &PeerPersistent) -> bool) -> Result<()> {
        let devices_dir = self.ctx.join("devices");
        let entries = match std::fs::read_dir(&devices_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let Some(bytes) = read_record(&entry.path()) else { continue };
            let Ok(record) = PeerPersistent::decode(&bytes) else { continue };
            if !visit(record.mac, &record) {
                break;
            }
        }
        Ok(())
    }
}

/// Persistent + volatile store for channels, rooted at a context path.
#[derive(Debug, Clone)]
pub struct ChannelDirectory {
    ctx: PathBuf,
    volatile: HashMap<String, ChannelVolatile>,
}

impl ChannelDirectory {
    /// Open (without creating) the directory rooted at `ctx`.
    #[must_use]
    pub fn new(ctx: impl Into<PathBuf>) -> Self {
        Self { ctx: ctx.into(), volatile: HashMap::new() }
    }

    /// Write (or overwrite) the persistent record for a channel.
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn write_persistent(&self, record: &ChannelPersistent) -> Result<()> {
        write_record(&channel_dir(&self.ctx, &record.name), &record.encode())
    }

    /// Read the persistent record for `name`. A missing or corrupt file is
    /// "not found" (spec invariant 2), not an error.
    #[must_use]
    pub fn read_persistent(&self, name: &str) -> Option<ChannelPersistent> {
        read_record(&channel_dir(&self.ctx, name)).and_then(|bytes| ChannelPersistent::decode(&bytes).ok())
    }

    /// Overwrite-if-present, insert-if-absent on the volatile side.
    pub fn update_volatile(&mut self, name: &str, record: ChannelVolatile) {
        self.volatile.insert(name.to_string(), record);
    }

    /// Volatile state for `name`. Unlike the peer side, this lazily
    /// materializes a zero-initialized row for a channel never seen this
    /// session (spec §4.4: `flood_get_channel_volatile`).
    pub fn get_volatile(&mut self, name: &str) -> ChannelVolatile {
        *self.volatile.entry(name.to_string()).or_default()
    }

    /// `(persistent, volatile)`; absence of the persistent record is
    /// "not found" even if a volatile row exists.
    pub fn find(&mut self, name: &str) -> Option<(ChannelPersistent, ChannelVolatile)> {
        let persistent = self.read_persistent(name)?;
        let volatile = self.get_volatile(name);
        Some((persistent, volatile))
    }

    /// Delete the persistent record and drop the volatile row.
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure other than "already absent".
    pub fn remove(&mut self, name: &str) -> Result<()> {
        remove_record(&channel_dir(&self.ctx, name))?;
        self.volatile.remove(name);
        Ok(())
    }

    /// Walk every on-disk channel whose metadata parses, calling `visit`.
    /// Stops early if `visit` returns `false`.
    ///
    /// # Errors
    ///
    /// `Io` if the channels directory exists but cannot be read.
    pub fn enumerate(&self, mut visit: impl FnMut(&ChannelPersistent) -> bool) -> Result<()> {
        let channels_dir = self.ctx.join("channels");
        let entries = match std::fs::read_dir(&channels_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let Some(bytes) = read_record(&entry.path()) else { continue };
            let Ok(record) = ChannelPersistent::decode(&bytes) else { continue };
            if !visit(&record) {
                break;
            }
        }
        Ok(())
    }
}
