//! BLE Radio Driver
//!
//! Bridges `btleplug` and the link state machine: adapter events become
//! [`RadioEvent`]s. The commands answering one event run in order on a
//! single task, and their outcomes come back through the same event queue.
//!
//! The notification stream of a device is opened while its services are
//! discovered, so it exists before the first characteristic is subscribed.

use crate::domain::link::{LinkCommand, RadioEvent};
use crate::domain::models::{ChannelId, DeviceId, DiscoveredDevice, RadioState};
use anyhow::{anyhow, Result};
use btleplug::api::{
    Central, CentralEvent, CentralState, Manager as _, Peripheral as _, ScanFilter,
    ValueNotification,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Get the first Bluetooth adapter of the host
pub async fn default_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No Bluetooth adapter found"))
}

#[derive(Default)]
struct Registry {
    peripherals: HashMap<DeviceId, Peripheral>,
    notification_pumps: HashSet<DeviceId>,
}

impl Registry {
    /// A characteristic is only worth subscribing once its notifications
    /// have somewhere to go
    fn check_subscribable(&self, device: &DeviceId) -> Result<(), String> {
        if self.notification_pumps.contains(device) {
            Ok(())
        } else {
            Err(format!("notification stream of {} is not open", device))
        }
    }
}

#[derive(Clone)]
pub struct RadioDriver {
    adapter: Adapter,
    registry: Arc<Mutex<Registry>>,
    events: mpsc::UnboundedSender<RadioEvent>,
}

impl RadioDriver {
    pub fn new(adapter: Adapter, events: mpsc::UnboundedSender<RadioEvent>) -> Self {
        Self {
            adapter,
            registry: Arc::new(Mutex::new(Registry::default())),
            events,
        }
    }

    /// Report the current radio state and start forwarding adapter events
    pub async fn start(&self) -> Result<()> {
        let mut central_events = self.adapter.events().await?;

        let state = match self.adapter.adapter_state().await {
            Ok(state) => radio_state(state),
            Err(e) => {
                warn!("Could not read adapter state: {}", e);
                RadioState::Unknown
            }
        };
        self.emit(RadioEvent::RadioStateChanged(state));

        let driver = self.clone();
        tokio::spawn(async move {
            while let Some(event) = central_events.next().await {
                driver.on_central_event(event).await;
            }
            warn!("Adapter event stream ended");
        });

        Ok(())
    }

    async fn on_central_event(&self, event: CentralEvent) {
        match event {
            CentralEvent::StateUpdate(state) => {
                self.emit(RadioEvent::RadioStateChanged(radio_state(state)));
            }
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                match self.describe(&id).await {
                    Ok(device) => self.emit(RadioEvent::DeviceDiscovered(device)),
                    Err(e) => debug!("Could not read properties of {:?}: {}", id, e),
                }
            }
            CentralEvent::DeviceDisconnected(id) => {
                self.emit(RadioEvent::Disconnected(DeviceId(id.to_string())));
            }
            _ => {}
        }
    }

    /// Resolve a peripheral, remember its handle and read its advertised name
    async fn describe(&self, id: &PeripheralId) -> Result<DiscoveredDevice> {
        let peripheral = self.adapter.peripheral(id).await?;
        let device_id = DeviceId(id.to_string());
        let props = peripheral.properties().await?;

        self.lock_registry()?
            .peripherals
            .insert(device_id.clone(), peripheral);

        Ok(DiscoveredDevice {
            id: device_id,
            name: props.as_ref().and_then(|p| p.local_name.clone()),
            rssi: props.and_then(|p| p.rssi),
        })
    }

    /// Run the commands answering one event, in order, in the background
    pub fn execute(&self, commands: Vec<LinkCommand>) {
        if commands.is_empty() {
            return;
        }

        let driver = self.clone();
        tokio::spawn(async move {
            run_in_order(commands, |command| driver.run_logged(command)).await;
        });
    }

    async fn run_logged(&self, command: LinkCommand) {
        debug!("Executing {:?}", command);
        if let Err(e) = self.run_command(command).await {
            error!("Radio command failed: {}", e);
        }
    }

    async fn run_command(&self, command: LinkCommand) -> Result<()> {
        match command {
            LinkCommand::StartScan => {
                if let Err(e) = self.adapter.start_scan(ScanFilter::default()).await {
                    self.emit(RadioEvent::ScanFailed(e.to_string()));
                }
            }
            LinkCommand::StopScan => {
                info!("Stopping BLE scan...");
                self.adapter.stop_scan().await?;
            }
            LinkCommand::Connect(device) => {
                let peripheral = self.peripheral(&device)?;
                match peripheral.connect().await {
                    Ok(()) => self.emit(RadioEvent::Connected(device)),
                    Err(e) => self.emit(RadioEvent::ConnectFailed {
                        device,
                        reason: e.to_string(),
                    }),
                }
            }
            LinkCommand::DiscoverServices(device) => {
                let peripheral = self.peripheral(&device)?;
                let result = match peripheral.discover_services().await {
                    Ok(()) => match self.open_notifications(&device, &peripheral).await {
                        Ok(()) => Ok(peripheral
                            .services()
                            .iter()
                            .map(|s| s.uuid)
                            .collect::<Vec<_>>()),
                        Err(e) => Err(format!("could not open notification stream: {}", e)),
                    },
                    Err(e) => Err(e.to_string()),
                };
                self.emit(RadioEvent::ServicesDiscovered { device, result });
            }
            LinkCommand::DiscoverChannels { device, service } => {
                // btleplug resolves characteristics together with services
                let peripheral = self.peripheral(&device)?;
                let result = peripheral
                    .services()
                    .into_iter()
                    .find(|s| s.uuid == service)
                    .map(|s| {
                        s.characteristics
                            .iter()
                            .map(|c| ChannelId {
                                service: c.service_uuid,
                                uuid: c.uuid,
                            })
                            .collect::<Vec<_>>()
                    })
                    .ok_or_else(|| format!("service {} not found", service));
                self.emit(RadioEvent::ChannelsDiscovered {
                    device,
                    service,
                    result,
                });
            }
            LinkCommand::Subscribe { device, channel } => {
                let peripheral = self.peripheral(&device)?;
                let ready = self.lock_registry()?.check_subscribable(&device);

                let characteristic = peripheral
                    .characteristics()
                    .into_iter()
                    .find(|c| c.service_uuid == channel.service && c.uuid == channel.uuid);

                let outcome = match (ready, characteristic) {
                    (Err(reason), _) => Err(reason),
                    (Ok(()), Some(c)) => {
                        peripheral.subscribe(&c).await.map_err(|e| e.to_string())
                    }
                    (Ok(()), None) => Err(format!("characteristic {} not found", channel.uuid)),
                };
                if let Err(reason) = outcome {
                    self.emit(RadioEvent::SubscribeFailed {
                        device,
                        channel,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Forward the notifications of a device, once per device. The device
    /// only counts as ready after the stream has been obtained.
    async fn open_notifications(&self, device: &DeviceId, peripheral: &Peripheral) -> Result<()> {
        if self.lock_registry()?.notification_pumps.contains(device) {
            return Ok(());
        }

        let mut notifications = peripheral.notifications().await?;
        self.lock_registry()?
            .notification_pumps
            .insert(device.clone());

        let driver = self.clone();
        let device = device.clone();
        tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                driver.emit(value_updated(&device, notification));
            }
            debug!("Notification stream of {} ended", device);
            if let Ok(mut registry) = driver.registry.lock() {
                registry.notification_pumps.remove(&device);
            }
        });

        Ok(())
    }

    fn peripheral(&self, device: &DeviceId) -> Result<Peripheral> {
        self.lock_registry()?
            .peripherals
            .get(device)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown peripheral {}", device))
    }

    fn lock_registry(&self) -> Result<std::sync::MutexGuard<'_, Registry>> {
        self.registry
            .lock()
            .map_err(|_| anyhow!("Failed to lock peripheral registry"))
    }

    fn emit(&self, event: RadioEvent) {
        let _ = self.events.send(event);
    }
}

fn radio_state(state: CentralState) -> RadioState {
    match state {
        CentralState::PoweredOn => RadioState::PoweredOn,
        CentralState::PoweredOff => RadioState::PoweredOff,
        _ => RadioState::Unknown,
    }
}

/// Every notification carries a value, even an empty one
fn value_updated(device: &DeviceId, notification: ValueNotification) -> RadioEvent {
    RadioEvent::ValueUpdated {
        device: device.clone(),
        channel: notification.uuid,
        result: Ok(notification.value),
    }
}

async fn run_in_order<T, F, Fut>(items: Vec<T>, mut run: F)
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    for item in items {
        run(item).await;
    }
}
