use std::fmt;
use tokio::sync::watch;
use uuid::Uuid;

/// Placeholder shown for a reading that has not been received (or could not be decoded)
pub const NOT_AVAILABLE: &str = "N/A";

/// Latest temperature/humidity pair, kept as the raw strings the sensor sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReading {
    pub temperature: String,
    pub humidity: String,
}

impl SensorReading {
    pub fn new(temperature: impl Into<String>, humidity: impl Into<String>) -> Self {
        Self {
            temperature: temperature.into(),
            humidity: humidity.into(),
        }
    }

    /// True once both values are something other than the placeholder
    pub fn has_values(&self) -> bool {
        self.temperature != NOT_AVAILABLE && self.humidity != NOT_AVAILABLE
    }
}

impl Default for SensorReading {
    fn default() -> Self {
        Self::new(NOT_AVAILABLE, NOT_AVAILABLE)
    }
}

/// Opaque handle of a remote peripheral, as reported by the radio stack
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(pub String);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub id: DeviceId,
    pub name: Option<String>,
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

/// A characteristic inside a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    pub service: Uuid,
    pub uuid: Uuid,
}

/// Adapter power state, as far as `btleplug` reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Unknown,
    PoweredOn,
    PoweredOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Scanning,
    Connecting,
    DiscoveringServices,
    DiscoveringChannels,
    Subscribed,
}

impl LinkState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Scanning => "SCANNING",
            Self::Connecting => "CONNECTING",
            Self::DiscoveringServices => "DISCOVERING SERVICES",
            Self::DiscoveringChannels => "DISCOVERING CHANNELS",
            Self::Subscribed => "SUBSCRIBED",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Messages sent from the Bluetooth thread to the UI thread
#[derive(Debug, Clone)]
pub enum AppEvent {
    SensorReading(SensorReading),
    LinkState(LinkState),
    DeviceFound(DiscoveredDevice),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Sensor,
    Bins,
    Debug,
}

/// Observable holder of the latest [`SensorReading`].
///
/// Both fields are replaced in one step, so subscribers never see a torn
/// temperature/humidity pair. Owned by the UI thread, which is the only writer.
pub struct ReadingBoard {
    sender: watch::Sender<SensorReading>,
}

impl ReadingBoard {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SensorReading::default());
        Self { sender }
    }

    /// Replace the current reading. Returns whether observers were notified.
    pub fn publish(&self, reading: SensorReading) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == reading {
                false
            } else {
                *current = reading;
                true
            }
        })
    }

    pub fn current(&self) -> SensorReading {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SensorReading> {
        self.sender.subscribe()
    }
}

impl Default for ReadingBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reading_is_placeholder() {
        let reading = SensorReading::default();
        assert_eq!(reading.temperature, "N/A");
        assert_eq!(reading.humidity, "N/A");
        assert!(!reading.has_values());
    }

    #[test]
    fn test_has_values_needs_both_fields() {
        assert!(SensorReading::new("23.5", "60").has_values());
        assert!(!SensorReading::new("23.5", NOT_AVAILABLE).has_values());
        assert!(!SensorReading::new(NOT_AVAILABLE, "60").has_values());
    }

    #[test]
    fn test_board_notifies_subscribers() {
        let board = ReadingBoard::new();
        let mut rx = board.subscribe();
        assert!(!rx.has_changed().unwrap());

        assert!(board.publish(SensorReading::new("21.0", "55")));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SensorReading::new("21.0", "55"));
        assert_eq!(board.current(), SensorReading::new("21.0", "55"));
    }

    #[test]
    fn test_board_skips_identical_reading() {
        let board = ReadingBoard::new();
        let mut rx = board.subscribe();
        assert!(!board.publish(SensorReading::default()));
        assert!(!rx.has_changed().unwrap());

        board.publish(SensorReading::new("1", "2"));
        rx.borrow_and_update();
        assert!(!board.publish(SensorReading::new("1", "2")));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_device_display_name() {
        let device = DiscoveredDevice {
            id: DeviceId("aa".into()),
            name: None,
            rssi: None,
        };
        assert_eq!(device.display_name(), "Unknown");
    }
}
