//! One poll cycle over every provisioned sensor.
//!
//! For each sensor:
//! read → normalize → resolve room → band → classify → detect transition
//! against the persisted prior → append reading → notify on raise/clear.
//!
//! No per-sensor failure escapes [`Collector::run_cycle`]. The collector
//! holds no state between runs; everything that must survive a restart
//! lives in the telemetry log and the configuration tables.
//!
//! The prior lookup and the append are not atomic. Two overlapping runs can
//! both see the same prior and both alert; they can never both suppress.
//! That duplicate is accepted rather than locked away.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::Instrument;

use crate::location::{self, RoomMapping};
use crate::normalize::normalize_temperature;
use crate::threshold::{classify, ThresholdConfig};
use crate::transition::{self, Transition};
use crate::{
    ConfigSourcePtr, DeviceSourcePtr, NotifierPtr, Reading, ReadFailure, Sensor,
    TelemetryStorePtr, TemperatureBand,
};

// ---

/// What happened to the alert text for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    NotNeeded,
    Sent,
    Failed,
}

/// Result of processing one sensor within a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorOutcome {
    ReadFailed,
    Processed {
        reading: Reading,
        transition: Transition,
        stored: bool,
        notify: NotifyOutcome,
    },
}

/// Counters for one cycle, logged by `main`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sensors: usize,
    pub read_failures: usize,
    pub stored: usize,
    pub store_failures: usize,
    pub raised: usize,
    pub cleared: usize,
    pub notify_failures: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: &SensorOutcome) {
        // ---
        self.sensors += 1;
        match outcome {
            SensorOutcome::ReadFailed => self.read_failures += 1,
            SensorOutcome::Processed {
                transition,
                stored,
                notify,
                ..
            } => {
                if *stored {
                    self.stored += 1;
                } else {
                    self.store_failures += 1;
                }
                match transition {
                    Transition::Raise => self.raised += 1,
                    Transition::Clear => self.cleared += 1,
                    Transition::None => {}
                }
                if *notify == NotifyOutcome::Failed {
                    self.notify_failures += 1;
                }
            }
        }
    }
}

/// Run orchestrator. All collaborators are injected.
pub struct Collector {
    sensors: Vec<Sensor>,
    devices: DeviceSourcePtr,
    store: TelemetryStorePtr,
    config_source: ConfigSourcePtr,
    notifier: NotifierPtr,
    default_band: TemperatureBand,
    concurrency: usize,
}

impl Collector {
    // ---
    pub fn new(
        sensors: Vec<Sensor>,
        devices: DeviceSourcePtr,
        store: TelemetryStorePtr,
        config_source: ConfigSourcePtr,
        notifier: NotifierPtr,
    ) -> Self {
        Self {
            sensors,
            devices,
            store,
            config_source,
            notifier,
            default_band: TemperatureBand::new(0.0, 35.0),
            concurrency: 1,
        }
    }

    /// Band for rooms without a `room_settings` row.
    pub fn with_default_band(mut self, band: TemperatureBand) -> Self {
        self.default_band = band;
        self
    }

    /// Sensors processed at once. Values below 1 mean sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run one cycle and report what happened.
    pub async fn run_cycle(&self) -> CycleReport {
        // ---
        self.run_cycle_detailed()
            .await
            .iter()
            .fold(CycleReport::default(), |mut report, (_, outcome)| {
                report.record(outcome);
                report
            })
    }

    /// Run one cycle, returning the outcome per sensor id.
    pub async fn run_cycle_detailed(&self) -> Vec<(String, SensorOutcome)> {
        // ---
        let (mapping, thresholds) = self.load_configuration().await;
        let (mapping, thresholds) = (&mapping, &thresholds);

        stream::iter(self.sensors.iter())
            .map(move |sensor| {
                let span = tracing::info_span!("sensor", sensor_id = %sensor.physical_id);
                async move {
                    let outcome = self.process_sensor(sensor, mapping, thresholds).await;
                    (sensor.physical_id.clone(), outcome)
                }
                .instrument(span)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }

    /// Fresh mapping and bands for this cycle. Table failures degrade to
    /// default rooms and the default band instead of aborting.
    async fn load_configuration(&self) -> (RoomMapping, ThresholdConfig) {
        // ---
        let mapping = match self.config_source.room_mapping().await {
            Ok(mapping) => {
                tracing::debug!("Loaded {} room mappings", mapping.len());
                mapping
            }
            Err(e) => {
                tracing::warn!("Room mapping unavailable, using default rooms: {}", e);
                RoomMapping::new()
            }
        };

        let thresholds = match self.config_source.thresholds(self.default_band).await {
            Ok(thresholds) => thresholds,
            Err(e) => {
                tracing::warn!("Room settings unavailable, using default band: {}", e);
                ThresholdConfig::new(self.default_band)
            }
        };

        (mapping, thresholds)
    }

    async fn process_sensor(
        &self,
        sensor: &Sensor,
        mapping: &RoomMapping,
        thresholds: &ThresholdConfig,
    ) -> SensorOutcome {
        // ---
        let sensor_id = sensor.physical_id.as_str();

        let status = match self.devices.read(sensor_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Read failed, skipping sensor this cycle: {}", e);
                return SensorOutcome::ReadFailed;
            }
        };

        let raw = match status.raw_temperature() {
            Some(Some(raw)) => raw,
            _ => {
                let e = ReadFailure::Malformed("no numeric temperature".to_string());
                tracing::error!("Read failed, skipping sensor this cycle: {}", e);
                return SensorOutcome::ReadFailed;
            }
        };

        let temperature = normalize_temperature(raw);
        let humidity = status.humidity();
        let room_name = location::resolve(sensor, mapping);
        let band = thresholds.band(room_name);
        let classification = classify(temperature, band);

        tracing::debug!(
            "raw={} temperature={:.1} room='{}' band={:.1}~{:.1} -> {}",
            raw,
            temperature,
            room_name,
            band.min,
            band.max,
            classification
        );

        // Must be read before this cycle's row is appended.
        let prior = match self.store.last_classification(sensor_id).await {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!("History unavailable, assuming prior normal: {}", e);
                None
            }
        };
        let transition = transition::detect(prior, classification);

        let reading = Reading {
            sensor_id: sensor_id.to_string(),
            room_name: room_name.to_string(),
            temperature,
            humidity,
            classification,
            created_at: Utc::now(),
        };

        let stored = match self.store.append(&reading).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to store reading, dropping it: {}", e);
                false
            }
        };

        // Sent even if the append failed; the next cycle may then raise again.
        let notify = match transition::message(
            transition,
            sensor,
            room_name,
            temperature,
            humidity,
            band,
        ) {
            None => NotifyOutcome::NotNeeded,
            Some(text) => match self.notifier.send(&text).await {
                Ok(()) => {
                    tracing::info!("Notified {:?}: {}", transition, text);
                    NotifyOutcome::Sent
                }
                Err(e) => {
                    tracing::warn!("Notification failed ({:?}): {}", transition, e);
                    NotifyOutcome::Failed
                }
            },
        };

        SensorOutcome::Processed {
            reading,
            transition,
            stored,
            notify,
        }
    }
}
