//! Fan-out callback registry (spec §4.9: "callback registration for
//! message-received, message-status-change, device-added/updated,
//! packet-sent, packet-received").
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::sync::Mutex;

use flud_engine::{Notification, NotificationSink};

type Callback = Box<dyn Fn(Notification) + Send + Sync>;

/// Holds every callback an application has registered and fans each
/// [`Notification`] out to all of them, in registration order.
///
/// [`flud_engine::NotificationSink`] is blanket-implemented for a single
/// closure; this type exists because spec §4.9 allows more than one
/// registration per event stream.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: Mutex<Vec<Callback>>,
}

impl CallbackRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Every registration is invoked, in order, for
    /// every subsequent notification.
    pub fn register(&self, callback: impl Fn(Notification) + Send + Sync + 'static) {
        self.callbacks.lock().expect("callback registry mutex poisoned").push(Box::new(callback));
    }
}

impl NotificationSink for CallbackRegistry {
    fn notify(&self, event: Notification) {
        let callbacks = self.callbacks.lock().expect("callback registry mutex poisoned");
        for callback in callbacks.iter() {
            callback(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn every_registered_callback_fires() {
        let registry = CallbackRegistry::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let (a2, b2) = (a.clone(), b.clone());
        registry.register(move |_| {
            a2.fetch_add(1, Ordering::Relaxed);
        });
        registry.register(move |_| {
            b2.fetch_add(1, Ordering::Relaxed);
        });

        registry.notify(Notification::DeviceAdded { mac: flud_proto::MacAddr::new([1; 6]) });

        assert_eq!(a.load(Ordering::Relaxed), 1);
        assert_eq!(b.load(Ordering::Relaxed), 1);
    }
}
