//! Bluetooth Service Module
//!
//! Owns the sensor link on the Bluetooth thread. Radio events are fed through
//! [`SensorLink`] one at a time; commands go to the radio driver, readings and
//! status changes go to the UI thread as [`AppEvent`]s.

use crate::domain::link::{LinkAction, LinkCommand, RadioEvent, SensorLink};
use crate::domain::models::{AppEvent, LinkState, MessageSeverity, StatusMessage};
use crate::infrastructure::bluetooth::radio::{self, RadioDriver};
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

pub struct BluetoothService {
    link: SensorLink,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl BluetoothService {
    pub fn new(event_sender: mpsc::UnboundedSender<AppEvent>, target_name: &str) -> Self {
        Self {
            link: SensorLink::new(target_name),
            event_sender,
        }
    }

    /// Drive the link until the adapter goes away
    pub async fn run(mut self) -> Result<()> {
        let adapter = radio::default_adapter().await?;
        let (radio_tx, mut radio_rx) = mpsc::unbounded_channel();
        let driver = RadioDriver::new(adapter, radio_tx);

        self.send_log(
            &format!("Looking for sensor \"{}\"...", self.link.target_name()),
            MessageSeverity::Info,
        );
        driver.start().await?;

        while let Some(event) = radio_rx.recv().await {
            driver.execute(self.process(event));
        }

        Ok(())
    }

    /// Apply one radio event and return the commands to hand to the driver
    fn process(&mut self, event: RadioEvent) -> Vec<LinkCommand> {
        if let RadioEvent::DeviceDiscovered(device) = &event {
            let _ = self
                .event_sender
                .send(AppEvent::DeviceFound(device.clone()));
        }

        let before = self.link.state();
        let mut commands = Vec::new();

        for action in self.link.handle(event) {
            match action {
                LinkAction::Command(command) => commands.push(command),
                LinkAction::Publish(reading) => {
                    let _ = self.event_sender.send(AppEvent::SensorReading(reading));
                }
            }
        }

        let after = self.link.state();
        if before != after {
            info!("Link state: {} -> {}", before, after);
            let _ = self.event_sender.send(AppEvent::LinkState(after));
            if let Some(message) = self.describe_transition(after) {
                self.send_log(&message, MessageSeverity::Info);
            }
        }

        commands
    }

    fn describe_transition(&self, state: LinkState) -> Option<String> {
        let device = self
            .link
            .current_device()
            .map(|d| d.display_name().to_string())
            .unwrap_or_default();

        match state {
            LinkState::Idle => None,
            LinkState::Scanning => Some("Scanning for sensor...".to_string()),
            LinkState::Connecting => Some(format!("Connecting to {}...", device)),
            LinkState::DiscoveringServices => Some(format!("Connected to {}", device)),
            LinkState::DiscoveringChannels => None,
            LinkState::Subscribed => Some("Waiting for sensor data...".to_string()),
        }
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }
}
