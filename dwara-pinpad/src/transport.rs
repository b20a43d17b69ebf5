//! Transport Adapter Trait
//!
//! The wireless transport (advertising parameters, connection negotiation,
//! link-layer behavior) lives outside this crate. Platform crates implement
//! this trait with their BLE stack and deliver inbound writes and connection
//! notifications into the [`PinpadServer`](crate::PinpadServer) themselves.

/// Trait for the BLE transport carrying the pinpad service.
pub trait Transport {
    /// Error type for transport operations
    type Error;

    /// Start advertising the pinpad service under `device_name`.
    ///
    /// Must be safe to call while already advertising.
    fn start_advertising(&mut self, device_name: &str) -> Result<(), Self::Error>;

    /// Stop advertising. Must be safe to call while already stopped.
    fn stop_advertising(&mut self) -> Result<(), Self::Error>;

    /// Drive the status indicator (a binary output reflecting whether the
    /// peripheral is accepting submissions).
    fn set_status(&mut self, active: bool) -> Result<(), Self::Error>;
}
