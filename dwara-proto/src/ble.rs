//! BLE GATT Service Protocol Constants for Dwara Pinpads
//!
//! This module defines the BLE service UUIDs used by pinpad peripherals and
//! the host tools that talk to them.

/// BLE Service UUID: d3a41000-6f2c-4b1e-0000-000000000000
pub const SERVICE_UUID: &str = "d3a41000-6f2c-4b1e-0000-000000000000";

/// Pinpad Characteristic UUID (write): carries `user:code` submissions
pub const PINPAD_UUID: &str = "d3a41001-6f2c-4b1e-0000-000000000000";

/// Status Characteristic UUID (read/notify): `active` while advertising
pub const STATUS_UUID: &str = "d3a41002-6f2c-4b1e-0000-000000000000";
