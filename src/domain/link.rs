//! Sensor Link State Machine
//!
//! Walks one peripheral from discovery to streaming notifications:
//!
//! ```text
//! Idle ─power on─▶ Scanning ─target found─▶ Connecting ─connected─▶ DiscoveringServices
//!                                                                         │
//!                          Subscribed ◀─channels found─ DiscoveringChannels ◀─services found
//! ```
//!
//! The machine is pure: it consumes [`RadioEvent`]s and answers with
//! [`LinkAction`]s, leaving the radio calls to the Bluetooth driver.
//! Disconnects and connection failures are logged but never recovered from.

use crate::domain::error::LinkError;
use crate::domain::models::{
    ChannelId, DeviceId, DiscoveredDevice, LinkState, RadioState, SensorReading,
};
use crate::domain::protocol;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Everything the radio stack reports to the link
#[derive(Debug, Clone)]
pub enum RadioEvent {
    RadioStateChanged(RadioState),
    ScanFailed(String),
    DeviceDiscovered(DiscoveredDevice),
    Connected(DeviceId),
    ConnectFailed {
        device: DeviceId,
        reason: String,
    },
    Disconnected(DeviceId),
    ServicesDiscovered {
        device: DeviceId,
        result: Result<Vec<Uuid>, String>,
    },
    ChannelsDiscovered {
        device: DeviceId,
        service: Uuid,
        result: Result<Vec<ChannelId>, String>,
    },
    SubscribeFailed {
        device: DeviceId,
        channel: ChannelId,
        reason: String,
    },
    ValueUpdated {
        device: DeviceId,
        channel: Uuid,
        result: Result<Vec<u8>, String>,
    },
}

/// Requests issued to the radio stack. All of them are fire-and-forget;
/// their outcome comes back as a [`RadioEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
    StartScan,
    StopScan,
    Connect(DeviceId),
    DiscoverServices(DeviceId),
    DiscoverChannels { device: DeviceId, service: Uuid },
    Subscribe { device: DeviceId, channel: ChannelId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    Command(LinkCommand),
    Publish(SensorReading),
}

pub struct SensorLink {
    target_name: String,
    state: LinkState,
    current: Option<DiscoveredDevice>,
}

impl SensorLink {
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            state: LinkState::Idle,
            current: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn current_device(&self) -> Option<&DiscoveredDevice> {
        self.current.as_ref()
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Feed one event into the machine
    pub fn handle(&mut self, event: RadioEvent) -> Vec<LinkAction> {
        match event {
            RadioEvent::RadioStateChanged(radio) => self.on_radio_state(radio),
            RadioEvent::ScanFailed(reason) => {
                error!("{}", LinkError::Discovery(reason));
                Vec::new()
            }
            RadioEvent::DeviceDiscovered(device) => self.on_device_discovered(device),
            RadioEvent::Connected(device) => self.on_connected(device),
            RadioEvent::ConnectFailed { device, reason } => {
                // Known gap: the link stays in Connecting and nothing retries.
                warn!(
                    "{} (device {}), link left in {}",
                    LinkError::Connection(reason),
                    device,
                    self.state
                );
                Vec::new()
            }
            RadioEvent::Disconnected(device) => self.on_disconnected(device),
            RadioEvent::ServicesDiscovered { device, result } => {
                self.on_services_discovered(device, result)
            }
            RadioEvent::ChannelsDiscovered {
                device,
                service,
                result,
            } => self.on_channels_discovered(device, service, result),
            RadioEvent::SubscribeFailed {
                device,
                channel,
                reason,
            } => {
                error!(
                    "{} (device {}, characteristic {})",
                    LinkError::Notification(reason),
                    device,
                    channel.uuid
                );
                Vec::new()
            }
            RadioEvent::ValueUpdated {
                device,
                channel,
                result,
            } => self.on_value_updated(device, channel, result),
        }
    }

    fn on_radio_state(&mut self, radio: RadioState) -> Vec<LinkAction> {
        debug!("Radio state changed: {:?}", radio);

        if radio != RadioState::PoweredOn {
            warn!("{}", LinkError::RadioUnavailable(radio));
            return Vec::new();
        }

        if self.state != LinkState::Idle {
            debug!("Radio powered on while {}, nothing to do", self.state);
            return Vec::new();
        }

        info!("Bluetooth is powered on. Starting scan...");
        self.state = LinkState::Scanning;
        vec![LinkAction::Command(LinkCommand::StartScan)]
    }

    fn on_device_discovered(&mut self, device: DiscoveredDevice) -> Vec<LinkAction> {
        debug!("Discovered peripheral: {}", device.display_name());

        if self.state != LinkState::Scanning {
            return Vec::new();
        }

        if device.name.as_deref() != Some(self.target_name.as_str()) {
            return Vec::new();
        }

        info!(
            "Connecting to peripheral: {} ({})",
            device.display_name(),
            device.id
        );
        let id = device.id.clone();
        self.current = Some(device);
        self.state = LinkState::Connecting;

        vec![
            LinkAction::Command(LinkCommand::StopScan),
            LinkAction::Command(LinkCommand::Connect(id)),
        ]
    }

    fn on_connected(&mut self, device: DeviceId) -> Vec<LinkAction> {
        if self.state != LinkState::Connecting || !self.is_current(&device) {
            debug!("Ignoring connection of {} while {}", device, self.state);
            return Vec::new();
        }

        info!("Connected to peripheral: {}", device);
        self.state = LinkState::DiscoveringServices;
        vec![LinkAction::Command(LinkCommand::DiscoverServices(device))]
    }

    fn on_disconnected(&mut self, device: DeviceId) -> Vec<LinkAction> {
        if !self.is_current(&device) {
            return Vec::new();
        }

        // Known gap: no rescan, no reconnect. The link stays stalled.
        self.current = None;
        warn!(
            "Peripheral {} disconnected while {}; not reconnecting",
            device, self.state
        );
        Vec::new()
    }

    fn on_services_discovered(
        &mut self,
        device: DeviceId,
        result: Result<Vec<Uuid>, String>,
    ) -> Vec<LinkAction> {
        let services = match result {
            Ok(services) => services,
            Err(reason) => {
                error!("{}", LinkError::ServiceDiscovery(reason));
                return Vec::new();
            }
        };

        if self.state != LinkState::DiscoveringServices || !self.is_current(&device) {
            debug!("Ignoring services of {} while {}", device, self.state);
            return Vec::new();
        }

        if services.is_empty() {
            warn!("Peripheral {} exposes no services", device);
            return Vec::new();
        }

        let actions: Vec<LinkAction> = services
            .into_iter()
            .map(|service| {
                info!("Discovered service: {}", service);
                LinkAction::Command(LinkCommand::DiscoverChannels {
                    device: device.clone(),
                    service,
                })
            })
            .collect();

        self.state = LinkState::DiscoveringChannels;
        actions
    }

    fn on_channels_discovered(
        &mut self,
        device: DeviceId,
        service: Uuid,
        result: Result<Vec<ChannelId>, String>,
    ) -> Vec<LinkAction> {
        let channels = match result {
            Ok(channels) => channels,
            Err(reason) => {
                error!("{} (service {})", LinkError::ChannelDiscovery(reason), service);
                return Vec::new();
            }
        };

        let accepting = matches!(
            self.state,
            LinkState::DiscoveringChannels | LinkState::Subscribed
        );
        if !accepting || !self.is_current(&device) {
            debug!("Ignoring characteristics of {} while {}", device, self.state);
            return Vec::new();
        }

        // TODO: decide whether Subscribed should wait for every subscription to be acknowledged
        let actions: Vec<LinkAction> = channels
            .into_iter()
            .map(|channel| {
                info!("Discovered characteristic: {}", channel.uuid);
                LinkAction::Command(LinkCommand::Subscribe {
                    device: device.clone(),
                    channel,
                })
            })
            .collect();

        if !actions.is_empty() {
            self.state = LinkState::Subscribed;
        }
        actions
    }

    fn on_value_updated(
        &mut self,
        device: DeviceId,
        channel: Uuid,
        result: Result<Vec<u8>, String>,
    ) -> Vec<LinkAction> {
        if !self.is_current(&device) {
            return Vec::new();
        }

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(reason) => {
                error!("{} ({})", LinkError::Notification(reason), channel);
                return Vec::new();
            }
        };

        debug!("Received data: {}", String::from_utf8_lossy(&bytes));

        let reading = match protocol::parse_payload(&bytes) {
            Ok(reading) => {
                info!(
                    temperature = %reading.temperature,
                    humidity = %reading.humidity,
                    "Parsed sensor data"
                );
                reading
            }
            Err(e) => {
                warn!("{}", LinkError::from(e));
                SensorReading::default()
            }
        };

        vec![LinkAction::Publish(reading)]
    }

    fn is_current(&self, device: &DeviceId) -> bool {
        self.current.as_ref().is_some_and(|d| &d.id == device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: Uuid = Uuid::from_u128(0x0000ffe0_0000_1000_8000_00805f9b34fb);
    const CHANNEL: Uuid = Uuid::from_u128(0x0000ffe1_0000_1000_8000_00805f9b34fb);

    fn device(id: &str, name: Option<&str>) -> DiscoveredDevice {
        DiscoveredDevice {
            id: DeviceId(id.to_string()),
            name: name.map(str::to_string),
            rssi: Some(-60),
        }
    }

    fn id(id: &str) -> DeviceId {
        DeviceId(id.to_string())
    }

    fn commands(actions: Vec<LinkAction>) -> Vec<LinkCommand> {
        actions
            .into_iter()
            .filter_map(|a| match a {
                LinkAction::Command(c) => Some(c),
                LinkAction::Publish(_) => None,
            })
            .collect()
    }

    fn scanning_link() -> SensorLink {
        let mut link = SensorLink::new(protocol::TARGET_NAME);
        link.handle(RadioEvent::RadioStateChanged(RadioState::PoweredOn));
        link
    }

    fn subscribed_link() -> SensorLink {
        let mut link = scanning_link();
        link.handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))));
        link.handle(RadioEvent::Connected(id("s1")));
        link.handle(RadioEvent::ServicesDiscovered {
            device: id("s1"),
            result: Ok(vec![SERVICE]),
        });
        link.handle(RadioEvent::ChannelsDiscovered {
            device: id("s1"),
            service: SERVICE,
            result: Ok(vec![ChannelId {
                service: SERVICE,
                uuid: CHANNEL,
            }]),
        });
        assert_eq!(link.state(), LinkState::Subscribed);
        link
    }

    fn value(bytes: &[u8]) -> RadioEvent {
        RadioEvent::ValueUpdated {
            device: id("s1"),
            channel: CHANNEL,
            result: Ok(bytes.to_vec()),
        }
    }

    #[test]
    fn test_power_on_starts_scan() {
        let mut link = SensorLink::new("HMSoft");
        let actions = link.handle(RadioEvent::RadioStateChanged(RadioState::PoweredOn));
        assert_eq!(link.state(), LinkState::Scanning);
        assert_eq!(commands(actions), vec![LinkCommand::StartScan]);
    }

    #[test]
    fn test_radio_unavailable_stays_idle() {
        for radio in [
            RadioState::PoweredOff,
            RadioState::Unknown,
        ] {
            let mut link = SensorLink::new("HMSoft");
            assert!(link.handle(RadioEvent::RadioStateChanged(radio)).is_empty());
            assert_eq!(link.state(), LinkState::Idle);
        }
    }

    #[test]
    fn test_second_power_on_does_not_rescan() {
        let mut link = scanning_link();
        assert!(link
            .handle(RadioEvent::RadioStateChanged(RadioState::PoweredOn))
            .is_empty());
        assert_eq!(link.state(), LinkState::Scanning);
    }

    #[test]
    fn test_target_discovery_connects_once() {
        let mut link = scanning_link();
        let actions = link.handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))));

        assert_eq!(link.state(), LinkState::Connecting);
        assert_eq!(
            commands(actions),
            vec![LinkCommand::StopScan, LinkCommand::Connect(id("s1"))]
        );
        assert_eq!(link.current_device().map(|d| d.id.clone()), Some(id("s1")));

        // Scanning has stopped; a late advertisement must not trigger another connect.
        let again = link.handle(RadioEvent::DeviceDiscovered(device("s2", Some("HMSoft"))));
        assert!(again.is_empty());
        assert_eq!(link.current_device().map(|d| d.id.clone()), Some(id("s1")));
    }

    #[test]
    fn test_other_device_is_ignored() {
        let mut link = scanning_link();
        let actions = link.handle(RadioEvent::DeviceDiscovered(device("o1", Some("OtherDevice"))));
        assert!(actions.is_empty());
        assert_eq!(link.state(), LinkState::Scanning);
        assert!(link.current_device().is_none());

        assert!(link
            .handle(RadioEvent::DeviceDiscovered(device("o2", None)))
            .is_empty());
        assert!(link
            .handle(RadioEvent::DeviceDiscovered(device("o3", Some("hmsoft"))))
            .is_empty());
        assert_eq!(link.state(), LinkState::Scanning);
    }

    #[test]
    fn test_discovery_before_power_on_is_ignored() {
        let mut link = SensorLink::new("HMSoft");
        assert!(link
            .handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))))
            .is_empty());
        assert_eq!(link.state(), LinkState::Idle);
    }

    #[test]
    fn test_custom_target_name() {
        let mut link = SensorLink::new("Bokashi-01");
        link.handle(RadioEvent::RadioStateChanged(RadioState::PoweredOn));
        assert!(link
            .handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))))
            .is_empty());
        let actions = link.handle(RadioEvent::DeviceDiscovered(device("b1", Some("Bokashi-01"))));
        assert_eq!(commands(actions).len(), 2);
        assert_eq!(link.state(), LinkState::Connecting);
    }

    #[test]
    fn test_connected_discovers_services() {
        let mut link = scanning_link();
        link.handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))));

        assert!(link.handle(RadioEvent::Connected(id("other"))).is_empty());
        assert_eq!(link.state(), LinkState::Connecting);

        let actions = link.handle(RadioEvent::Connected(id("s1")));
        assert_eq!(link.state(), LinkState::DiscoveringServices);
        assert_eq!(
            commands(actions),
            vec![LinkCommand::DiscoverServices(id("s1"))]
        );
    }

    #[test]
    fn test_connect_failure_stalls() {
        let mut link = scanning_link();
        link.handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))));
        let actions = link.handle(RadioEvent::ConnectFailed {
            device: id("s1"),
            reason: "timeout".into(),
        });
        assert!(actions.is_empty());
        assert_eq!(link.state(), LinkState::Connecting);
    }

    #[test]
    fn test_services_fan_out() {
        let mut link = scanning_link();
        link.handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))));
        link.handle(RadioEvent::Connected(id("s1")));

        let other = Uuid::from_u128(0x180a);
        let actions = link.handle(RadioEvent::ServicesDiscovered {
            device: id("s1"),
            result: Ok(vec![SERVICE, other]),
        });
        assert_eq!(link.state(), LinkState::DiscoveringChannels);
        assert_eq!(
            commands(actions),
            vec![
                LinkCommand::DiscoverChannels {
                    device: id("s1"),
                    service: SERVICE
                },
                LinkCommand::DiscoverChannels {
                    device: id("s1"),
                    service: other
                },
            ]
        );
    }

    #[test]
    fn test_service_discovery_error_does_not_transition() {
        let mut link = scanning_link();
        link.handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))));
        link.handle(RadioEvent::Connected(id("s1")));

        let actions = link.handle(RadioEvent::ServicesDiscovered {
            device: id("s1"),
            result: Err("GATT error".into()),
        });
        assert!(actions.is_empty());
        assert_eq!(link.state(), LinkState::DiscoveringServices);

        assert!(link
            .handle(RadioEvent::ServicesDiscovered {
                device: id("s1"),
                result: Ok(vec![]),
            })
            .is_empty());
        assert_eq!(link.state(), LinkState::DiscoveringServices);
    }

    #[test]
    fn test_every_channel_is_subscribed() {
        let mut link = scanning_link();
        link.handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))));
        link.handle(RadioEvent::Connected(id("s1")));
        let other = Uuid::from_u128(0x180a);
        link.handle(RadioEvent::ServicesDiscovered {
            device: id("s1"),
            result: Ok(vec![SERVICE, other]),
        });

        let first = ChannelId {
            service: SERVICE,
            uuid: CHANNEL,
        };
        let actions = link.handle(RadioEvent::ChannelsDiscovered {
            device: id("s1"),
            service: SERVICE,
            result: Ok(vec![first]),
        });
        assert_eq!(link.state(), LinkState::Subscribed);
        assert_eq!(
            commands(actions),
            vec![LinkCommand::Subscribe {
                device: id("s1"),
                channel: first
            }]
        );

        // The second service answers later and is still subscribed.
        let late = [
            ChannelId {
                service: other,
                uuid: Uuid::from_u128(0x2a29),
            },
            ChannelId {
                service: other,
                uuid: Uuid::from_u128(0x2a24),
            },
        ];
        let actions = link.handle(RadioEvent::ChannelsDiscovered {
            device: id("s1"),
            service: other,
            result: Ok(late.to_vec()),
        });
        assert_eq!(commands(actions).len(), 2);
        assert_eq!(link.state(), LinkState::Subscribed);
    }

    #[test]
    fn test_channel_discovery_error_is_swallowed() {
        let mut link = scanning_link();
        link.handle(RadioEvent::DeviceDiscovered(device("s1", Some("HMSoft"))));
        link.handle(RadioEvent::Connected(id("s1")));
        link.handle(RadioEvent::ServicesDiscovered {
            device: id("s1"),
            result: Ok(vec![SERVICE]),
        });

        let actions = link.handle(RadioEvent::ChannelsDiscovered {
            device: id("s1"),
            service: SERVICE,
            result: Err("insufficient authentication".into()),
        });
        assert!(actions.is_empty());
        assert_eq!(link.state(), LinkState::DiscoveringChannels);
    }

    #[test]
    fn test_value_is_decoded_and_published() {
        let mut link = subscribed_link();
        assert_eq!(
            link.handle(value(b"23.5,60")),
            vec![LinkAction::Publish(SensorReading::new("23.5", "60"))]
        );
    }

    #[test]
    fn test_bad_payload_publishes_placeholder() {
        let mut link = subscribed_link();
        link.handle(value(b"23.5,60"));
        let payloads: [&[u8]; 3] = [b"23.5", b"23.5,60,extra", &[0xff, 0xfe]];
        for payload in payloads {
            assert_eq!(
                link.handle(value(payload)),
                vec![LinkAction::Publish(SensorReading::default())]
            );
        }
    }

    #[test]
    fn test_empty_payload_publishes_placeholder() {
        let mut link = subscribed_link();
        link.handle(value(b"23.5,60"));
        assert_eq!(
            link.handle(value(b"")),
            vec![LinkAction::Publish(SensorReading::default())]
        );
    }

    #[test]
    fn test_notification_errors_are_swallowed() {
        let mut link = subscribed_link();
        assert!(link
            .handle(RadioEvent::ValueUpdated {
                device: id("s1"),
                channel: CHANNEL,
                result: Err("read not permitted".into()),
            })
            .is_empty());
        assert!(link
            .handle(RadioEvent::SubscribeFailed {
                device: id("s1"),
                channel: ChannelId {
                    service: SERVICE,
                    uuid: CHANNEL
                },
                reason: "not notifiable".into(),
            })
            .is_empty());
        assert_eq!(link.state(), LinkState::Subscribed);
    }

    #[test]
    fn test_disconnect_releases_device_without_rescan() {
        let mut link = subscribed_link();

        assert!(link.handle(RadioEvent::Disconnected(id("other"))).is_empty());
        assert!(link.current_device().is_some());

        let actions = link.handle(RadioEvent::Disconnected(id("s1")));
        assert!(actions.is_empty());
        assert!(link.current_device().is_none());
        assert_eq!(link.state(), LinkState::Subscribed);

        // Late notifications from the released device are dropped.
        assert!(link.handle(value(b"1,2")).is_empty());
    }

    #[test]
    fn test_scan_failure_is_logged_only() {
        let mut link = scanning_link();
        assert!(link
            .handle(RadioEvent::ScanFailed("adapter busy".into()))
            .is_empty());
        assert_eq!(link.state(), LinkState::Scanning);
    }
}
