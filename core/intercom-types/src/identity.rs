//! Device identity, fixed at boot.

use crate::ids::{FirmwareVersion, ModelName, SerialNumber};
use serde::{Deserialize, Serialize};

/// Identity the device announces to the monitoring server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Factory serial number.
    pub serial: SerialNumber,
    /// Running firmware version.
    pub firmware: FirmwareVersion,
    /// Hardware model.
    pub model: ModelName,
}

impl DeviceIdentity {
    /// Builds an identity from raw strings, validating each field.
    pub fn new(serial: &str, firmware: &str, model: &str) -> crate::Result<Self> {
        Ok(Self {
            serial: serial.parse()?,
            firmware: firmware.parse()?,
            model: model.parse()?,
        })
    }
}
