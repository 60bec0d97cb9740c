//! Sensor to room resolution.
//!
//! Rooms are edited by operators in the `sensor_mapping` table. A fresh
//! [`RoomMapping`] is loaded at the start of every cycle, so moving a sensor
//! takes effect on the next run without a redeploy.

use std::collections::HashMap;

use crate::Sensor;

// ---

/// Snapshot of `sensor_id -> room_name` for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomMapping {
    rooms: HashMap<String, String>,
}

impl RoomMapping {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the room for a sensor. Blank room names are ignored.
    pub fn insert(&mut self, sensor_id: impl Into<String>, room_name: impl Into<String>) {
        // ---
        let room_name = room_name.into();
        let room_name = room_name.trim();
        if room_name.is_empty() {
            return;
        }
        self.rooms.insert(sensor_id.into(), room_name.to_string());
    }

    pub fn get(&self, sensor_id: &str) -> Option<&str> {
        self.rooms.get(sensor_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RoomMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        // ---
        let mut mapping = RoomMapping::new();
        for (sensor_id, room_name) in iter {
            mapping.insert(sensor_id, room_name);
        }
        mapping
    }
}

/// Room a sensor currently belongs to, falling back to its provisioned default.
pub fn resolve<'a>(sensor: &'a Sensor, mapping: &'a RoomMapping) -> &'a str {
    // ---
    match mapping.get(&sensor.physical_id) {
        Some(room) => room,
        None => {
            tracing::debug!(
                sensor_id = %sensor.physical_id,
                "No room mapping, using default room '{}'",
                sensor.default_room
            );
            &sensor.default_room
        }
    }
}
