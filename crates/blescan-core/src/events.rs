//! Session event stream.
//!
//! [`SessionEvent`] mirrors the three [`ScanObserver`] callbacks as data, so
//! the output of a session can be logged, serialized or fanned out to several
//! consumers. [`EventObserver`] is an observer that forwards every callback
//! to a broadcast channel. [`QueueObserver`] feeds a single consumer through
//! an unbounded queue and never drops an event.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use blescan_types::DiscoveredDevice;

use crate::traits::ScanObserver;

/// Something a scan session reported.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// Scanning started or stopped.
    ScanStateChanged { scanning: bool, status: String },
    /// A device was seen for the first time in this session.
    DeviceFound {
        device: DiscoveredDevice,
        line: String,
    },
    /// A start or a running scan failed.
    ScanError { message: String },
}

impl SessionEvent {
    /// Build a device event, rendering the list line.
    pub fn device_found(device: &DiscoveredDevice) -> Self {
        SessionEvent::DeviceFound {
            line: device.to_string(),
            device: device.clone(),
        }
    }
}

/// Sender for session events.
pub type EventSender = broadcast::Sender<SessionEvent>;

/// Receiver for session events.
pub type EventReceiver = broadcast::Receiver<SessionEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    broadcast::channel(capacity)
}

/// An observer that publishes every callback on a broadcast channel.
#[derive(Debug, Clone)]
pub struct EventObserver {
    sender: EventSender,
}

impl EventObserver {
    /// Create an observer with its own channel.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create an observer publishing on an existing sender.
    pub fn with_sender(sender: EventSender) -> Self {
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn send(&self, event: SessionEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }
}

impl Default for EventObserver {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ScanObserver for EventObserver {
    fn on_scan_state_changed(&mut self, is_scanning: bool, status: &str) {
        self.send(SessionEvent::ScanStateChanged {
            scanning: is_scanning,
            status: status.to_string(),
        });
    }

    fn on_device_found(&mut self, device: &DiscoveredDevice) {
        self.send(SessionEvent::device_found(device));
    }

    fn on_scan_error(&mut self, message: &str) {
        self.send(SessionEvent::ScanError {
            message: message.to_string(),
        });
    }
}

/// Receiver for a [`QueueObserver`].
pub type QueueReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// An observer that queues every callback for one consumer.
///
/// Unlike [`EventObserver`], a slow consumer cannot lag behind and lose
/// events. The receiver sees the channel close once the observer (usually
/// owned by the session) is dropped.
#[derive(Debug, Clone)]
pub struct QueueObserver {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl QueueObserver {
    /// Create an observer and the receiver for its events.
    pub fn new() -> (Self, QueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: SessionEvent) {
        // Consumer gone; nothing left to tell
        let _ = self.sender.send(event);
    }
}

impl ScanObserver for QueueObserver {
    fn on_scan_state_changed(&mut self, is_scanning: bool, status: &str) {
        self.send(SessionEvent::ScanStateChanged {
            scanning: is_scanning,
            status: status.to_string(),
        });
    }

    fn on_device_found(&mut self, device: &DiscoveredDevice) {
        self.send(SessionEvent::device_found(device));
    }

    fn on_scan_error(&mut self, message: &str) {
        self.send(SessionEvent::ScanError {
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DiscoveredDevice {
        DiscoveredDevice {
            name: "Band".to_string(),
            address: "01:02:03:04:05:06".to_string(),
            signal_strength: -55,
        }
    }

    #[test]
    fn test_observer_forwards_in_order() {
        let mut observer = EventObserver::default();
        let mut rx = observer.subscribe();

        observer.on_scan_state_changed(true, "Scanning");
        observer.on_device_found(&device());
        observer.on_scan_error("boom");

        assert!(matches!(
            rx.try_recv().unwrap(),
            SessionEvent::ScanStateChanged { scanning: true, .. }
        ));
        match rx.try_recv().unwrap() {
            SessionEvent::DeviceFound { line, device } => {
                assert_eq!(line, "Band (01:02:03:04:05:06) RSSI: -55 dBm");
                assert_eq!(device.signal_strength, -55);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::ScanError {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_send_without_receivers_is_fine() {
        let mut observer = EventObserver::new(4);
        assert_eq!(observer.receiver_count(), 0);
        observer.on_scan_error("nobody listening");
    }

    #[test]
    fn test_shared_sender() {
        let (tx, mut rx) = event_channel(8);
        let mut observer = EventObserver::with_sender(tx);
        observer.on_scan_state_changed(false, "Scan stopped");
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_queue_observer_keeps_every_event() {
        let (mut observer, mut rx) = QueueObserver::new();
        for i in 0..500u16 {
            observer.on_device_found(&DiscoveredDevice {
                name: "Tag".to_string(),
                address: format!("TAG-{:03}", i),
                signal_strength: -70,
            });
        }
        drop(observer);

        let mut count = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(matches!(event, SessionEvent::DeviceFound { .. }));
            count += 1;
        }
        assert_eq!(count, 500);
    }

    #[tokio::test]
    async fn test_queue_closes_when_observer_dropped() {
        let (mut observer, mut rx) = QueueObserver::new();
        observer.on_scan_state_changed(false, "Scan stopped");
        drop(observer);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_event_json_shape() {
        let event = SessionEvent::device_found(&device());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "device_found");
        assert_eq!(json["device"]["address"], "01:02:03:04:05:06");
        assert_eq!(json["device"]["signal_strength"], -55);

        let back: SessionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
