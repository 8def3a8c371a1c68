//! Core types for the Hydra Mind inference core
//!
//! This module defines the data that flows through the core: the shared
//! sensor record, the partial updates producers write into it, the closed
//! behavioral state set, and the transition events published downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latest known value of every environmental measurement.
///
/// One instance lives inside [`crate::store::SensorStore`]; producers refresh
/// the fields they own and the inference engine reads atomic by-value copies.
/// Fields may have been refreshed at different wall-clock times by different
/// producers, but a snapshot never mixes values from a half-applied update.
///
/// The layout is C-compatible so the same record can cross the FFI boundary
/// to the display firmware.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReadings {
    /// Number of WiFi networks seen in the last scan
    pub wifi_network_count: u32,
    /// Average WiFi RSSI across those networks (dBm, more negative = weaker)
    pub wifi_avg_rssi: i32,
    /// Number of BLE devices seen in the last scan
    pub ble_device_count: u32,
    /// Average BLE RSSI across detected devices (dBm)
    pub ble_avg_rssi: i32,
    /// Free heap reported by the resource monitor (bytes)
    pub free_memory_bytes: u32,
    /// Seconds since boot
    pub uptime_seconds: u32,
    /// Recent user input detected
    pub user_interaction: bool,
    /// Storage card mounted and reachable
    pub storage_present: bool,
}

/// Partial refresh of [`SensorReadings`].
///
/// Each producer knows only a subset of the record; unset fields leave the
/// prior value authoritative. The constructors cover the two producer shapes
/// that exist on the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorUpdate {
    pub wifi_network_count: Option<u32>,
    pub wifi_avg_rssi: Option<i32>,
    pub ble_device_count: Option<u32>,
    pub ble_avg_rssi: Option<i32>,
    pub free_memory_bytes: Option<u32>,
    pub uptime_seconds: Option<u32>,
    pub user_interaction: Option<bool>,
    pub storage_present: Option<bool>,
}

impl SensorUpdate {
    /// Update shape written by the wireless scanner after each scan cycle.
    pub fn wireless_scan(
        wifi_network_count: u32,
        wifi_avg_rssi: i32,
        ble_device_count: u32,
        ble_avg_rssi: i32,
    ) -> Self {
        Self {
            wifi_network_count: Some(wifi_network_count),
            wifi_avg_rssi: Some(wifi_avg_rssi),
            ble_device_count: Some(ble_device_count),
            ble_avg_rssi: Some(ble_avg_rssi),
            ..Self::default()
        }
    }

    /// Update shape written by the resource monitor once per second.
    pub fn system_monitor(free_memory_bytes: u32, uptime_seconds: u32, storage_present: bool) -> Self {
        Self {
            free_memory_bytes: Some(free_memory_bytes),
            uptime_seconds: Some(uptime_seconds),
            storage_present: Some(storage_present),
            ..Self::default()
        }
    }

    /// Update shape written when the user-input path fires or clears.
    pub fn interaction(user_interaction: bool) -> Self {
        Self {
            user_interaction: Some(user_interaction),
            ..Self::default()
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields into `readings`, leaving the rest untouched.
    pub fn apply_to(&self, readings: &mut SensorReadings) {
        if let Some(v) = self.wifi_network_count {
            readings.wifi_network_count = v;
        }
        if let Some(v) = self.wifi_avg_rssi {
            readings.wifi_avg_rssi = v;
        }
        if let Some(v) = self.ble_device_count {
            readings.ble_device_count = v;
        }
        if let Some(v) = self.ble_avg_rssi {
            readings.ble_avg_rssi = v;
        }
        if let Some(v) = self.free_memory_bytes {
            readings.free_memory_bytes = v;
        }
        if let Some(v) = self.uptime_seconds {
            readings.uptime_seconds = v;
        }
        if let Some(v) = self.user_interaction {
            readings.user_interaction = v;
        }
        if let Some(v) = self.storage_present {
            readings.storage_present = v;
        }
    }
}

/// Behavioral state of the companion.
///
/// Closed set, created at [`BehaviorState::Idle`], mutated only by the
/// inference engine once per cycle, alive for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    Idle,
    Sniffing,
    Tracking,
    Learning,
    Excited,
    Sleeping,
    Error,
    Updating,
}

/// Label shown for a state code the display layer does not recognize.
pub const UNKNOWN_STATE_LABEL: &str = "Unknown";

/// Glyph shown for a state code the display layer does not recognize.
pub const UNKNOWN_STATE_GLYPH: &str = "\u{1F914}"; // 🤔

impl Default for BehaviorState {
    fn default() -> Self {
        BehaviorState::Idle
    }
}

impl BehaviorState {
    /// Stable wire code used across the FFI boundary.
    pub fn code(self) -> u8 {
        match self {
            BehaviorState::Idle => 0,
            BehaviorState::Sniffing => 1,
            BehaviorState::Tracking => 2,
            BehaviorState::Learning => 3,
            BehaviorState::Excited => 4,
            BehaviorState::Sleeping => 5,
            BehaviorState::Error => 6,
            BehaviorState::Updating => 7,
        }
    }

    /// Decode a wire code; `None` for out-of-range values.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(BehaviorState::Idle),
            1 => Some(BehaviorState::Sniffing),
            2 => Some(BehaviorState::Tracking),
            3 => Some(BehaviorState::Learning),
            4 => Some(BehaviorState::Excited),
            5 => Some(BehaviorState::Sleeping),
            6 => Some(BehaviorState::Error),
            7 => Some(BehaviorState::Updating),
            _ => None,
        }
    }

    /// Human-readable label for the status line.
    pub fn label(self) -> &'static str {
        match self {
            BehaviorState::Idle => "Idle",
            BehaviorState::Sniffing => "Sniffing",
            BehaviorState::Tracking => "Tracking",
            BehaviorState::Learning => "Learning",
            BehaviorState::Excited => "Excited",
            BehaviorState::Sleeping => "Sleeping",
            BehaviorState::Error => "Error",
            BehaviorState::Updating => "Updating",
        }
    }

    /// Mood glyph for the face renderer.
    pub fn glyph(self) -> &'static str {
        match self {
            BehaviorState::Idle => "\u{1F60A}",     // 😊
            BehaviorState::Sniffing => "\u{1F443}", // 👃
            BehaviorState::Tracking => "\u{1F441}", // 👁
            BehaviorState::Learning => "\u{1F9E0}", // 🧠
            BehaviorState::Excited => "\u{1F929}",  // 🤩
            BehaviorState::Sleeping => "\u{1F634}", // 😴
            BehaviorState::Error => "\u{1F480}",    // 💀
            BehaviorState::Updating => "\u{1F504}", // 🔄
        }
    }
}

impl std::fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display-facing `(label, glyph)` pair for a raw state code.
///
/// Total over the whole `u8` range: unknown codes map to the defined
/// fallback pair instead of failing.
pub fn display_for_code(code: u8) -> (&'static str, &'static str) {
    match BehaviorState::from_code(code) {
        Some(state) => (state.label(), state.glyph()),
        None => (UNKNOWN_STATE_LABEL, UNKNOWN_STATE_GLYPH),
    }
}

/// A behavioral state change, emitted by the engine at most once per cycle.
///
/// Consumed at most once by the transition channel; if the channel is full
/// the event is dropped and never resent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// State the engine is leaving
    pub previous: BehaviorState,
    /// State the engine is entering
    pub next: BehaviorState,
    /// Dwell time accumulated in `previous` (ms)
    pub time_in_previous_ms: u32,
    /// When the transition was decided
    pub occurred_at_utc: DateTime<Utc>,
    /// Engine instance that produced the event
    pub engine_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_merges_only_set_fields() {
        let mut readings = SensorReadings {
            wifi_network_count: 3,
            wifi_avg_rssi: -70,
            ble_device_count: 2,
            ble_avg_rssi: -60,
            free_memory_bytes: 100_000,
            uptime_seconds: 42,
            user_interaction: true,
            storage_present: true,
        };

        SensorUpdate::wireless_scan(12, -55, 4, -48).apply_to(&mut readings);

        assert_eq!(readings.wifi_network_count, 12);
        assert_eq!(readings.wifi_avg_rssi, -55);
        assert_eq!(readings.ble_device_count, 4);
        assert_eq!(readings.ble_avg_rssi, -48);
        // Fields the scanner does not own are untouched
        assert_eq!(readings.free_memory_bytes, 100_000);
        assert_eq!(readings.uptime_seconds, 42);
        assert!(readings.user_interaction);
        assert!(readings.storage_present);
    }

    #[test]
    fn test_empty_update_is_a_no_op() {
        let before = SensorReadings {
            wifi_network_count: 7,
            ..SensorReadings::default()
        };
        let mut after = before;

        let update = SensorUpdate::default();
        assert!(update.is_empty());
        update.apply_to(&mut after);

        assert_eq!(before, after);
    }

    #[test]
    fn test_state_codes_round_trip() {
        for code in 0..=7u8 {
            let state = BehaviorState::from_code(code).unwrap();
            assert_eq!(state.code(), code);
        }
        assert_eq!(BehaviorState::from_code(8), None);
        assert_eq!(BehaviorState::from_code(255), None);
    }

    #[test]
    fn test_display_lookup_is_total() {
        for code in 0..=255u8 {
            let (label, glyph) = display_for_code(code);
            assert!(!label.is_empty());
            assert!(!glyph.is_empty());
        }
        assert_eq!(display_for_code(0), ("Idle", "\u{1F60A}"));
        assert_eq!(
            display_for_code(200),
            (UNKNOWN_STATE_LABEL, UNKNOWN_STATE_GLYPH)
        );
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&BehaviorState::Sniffing).unwrap();
        assert_eq!(json, r#""sniffing""#);
        let back: BehaviorState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BehaviorState::Sniffing);
    }
}
