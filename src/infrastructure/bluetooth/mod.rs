//! Bluetooth Module
//!
//! Connects to the bokashi temperature/humidity sensor over BLE.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BluetoothService                      │
//! │   (Bluetooth thread - feeds events into SensorLink)      │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ LinkCommand / RadioEvent
//!                       ▼
//!                ┌────────────┐
//!                │   Radio    │
//!                │            │
//!                │ - btleplug │
//!                │ - events   │
//!                │ - commands │
//!                └────────────┘
//! ```
//!
//! Payload decoding lives in [`crate::domain::protocol`].
//!
//! ## Modules
//!
//! - [`radio`] - `btleplug` adapter driver
//! - [`service`] - Event loop owning the link state machine

pub mod radio;
pub mod service;

// Re-export main service for convenience
pub use service::BluetoothService;
