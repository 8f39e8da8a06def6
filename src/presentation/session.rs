use crate::domain::models::{
    AppEvent, DiscoveredDevice, LinkState, ReadingBoard, SensorReading, StatusMessage,
};
use std::collections::VecDeque;

const MAX_RECENT_MESSAGES: usize = 50;

/// UI-thread view of the sensor link, updated from the Bluetooth thread's events
pub struct LinkSession {
    reading: ReadingBoard,
    pub link_state: LinkState,
    pub status_message: Option<StatusMessage>,
    pub recent_messages: VecDeque<StatusMessage>,
    pub scanned_devices: Vec<DiscoveredDevice>,
}

impl LinkSession {
    pub fn new() -> Self {
        Self {
            reading: ReadingBoard::new(),
            link_state: LinkState::Idle,
            status_message: None,
            recent_messages: VecDeque::new(),
            scanned_devices: Vec::new(),
        }
    }

    pub fn reading(&self) -> SensorReading {
        self.reading.current()
    }

    pub fn board(&self) -> &ReadingBoard {
        &self.reading
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::SensorReading(reading) => {
                self.reading.publish(reading);
            }
            AppEvent::LinkState(state) => self.link_state = state,
            AppEvent::DeviceFound(device) => {
                if let Some(existing) = self
                    .scanned_devices
                    .iter_mut()
                    .find(|d| d.id == device.id)
                {
                    existing.rssi = device.rssi.or(existing.rssi);
                    if device.name.is_some() {
                        existing.name = device.name;
                    }
                } else {
                    self.scanned_devices.push(device);
                }
            }
            AppEvent::LogMessage(msg) => {
                if self.recent_messages.len() == MAX_RECENT_MESSAGES {
                    self.recent_messages.pop_front();
                }
                self.recent_messages.push_back(msg.clone());
                self.status_message = Some(msg);
            }
        }
    }
}

impl Default for LinkSession {
    fn default() -> Self {
        Self::new()
    }
}
