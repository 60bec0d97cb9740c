//! Room temperature collector.
//!
//! One invocation polls every provisioned sensor once, classifies each
//! reading against its room's temperature band, appends it to the telemetry
//! log and notifies only when a sensor changes between normal and abnormal.
//!
//! This crate follows the Explicit Module Boundary Pattern (EMBP): sibling
//! modules import each other only through the re-exports below, never by
//! reaching into a module's file directly.

mod collector;
mod config;
mod device;
mod error;
mod models;
mod notify;
mod schema;
mod store;

pub mod location;
pub mod normalize;
pub mod threshold;
pub mod transition;

pub use collector::{Collector, CycleReport, NotifyOutcome, SensorOutcome};
pub use config::{load_from, load_from_env, parse_sensors, Config};
pub use device::{parse_status, DeviceSource, DeviceSourcePtr, HttpDeviceSource};
pub use error::{ConfigError, NotifyFailure, ReadFailure, StoreFailure};
pub use location::RoomMapping;
pub use models::{Classification, DeviceAttribute, DeviceStatus, Reading, Sensor, TemperatureBand};
pub use notify::{Notifier, NotifierPtr, WebhookNotifier};
pub use schema::create_schema;
pub use store::{ConfigSource, ConfigSourcePtr, PgStore, TelemetryStore, TelemetryStorePtr};
pub use threshold::ThresholdConfig;
pub use transition::Transition;
