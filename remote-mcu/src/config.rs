//! Application configuration
//!
//! Defaults are compile-time constants. The device name can be overridden at
//! build time with the `REMOTE_DEVICE_NAME` environment variable.

use std::time::Duration;

use remote_proto::bms::{Features, OperationSupport};

use crate::advertising::{AdvertisingInterval, MAX_DEVICE_NAME_LEN};
use crate::auth::AuthorizationCode;
use crate::error::ConfigError;

pub const DEFAULT_DEVICE_NAME: &str = match option_env!("REMOTE_DEVICE_NAME") {
    Some(name) => name,
    None => "Remote BMS",
};

/// Run LED toggle period in the idle loop
pub const RUN_LED_BLINK_INTERVAL: Duration = Duration::from_millis(1000);


// Advertising interval range allowed by Bluetooth Core (20 ms .. 10.24 s)
const MIN_INTERVAL_UNITS: u16 = 0x0020;
const MAX_INTERVAL_UNITS: u16 = 0x4000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub device_name: String,
    pub auth_code: AuthorizationCode,
    /// Interval bounds used while advertising to bonded peers only
    pub filtered_interval: AdvertisingInterval,
    pub run_led_blink_interval: Duration,
    pub bms_features: Features,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            auth_code: AuthorizationCode::default(),
            filtered_interval: AdvertisingInterval::FILTERED,
            run_led_blink_interval: RUN_LED_BLINK_INTERVAL,
            bms_features: default_bms_features(),
        }
    }
}

impl AppConfig {
    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name = name.to_string();
        self
    }

    pub fn with_auth_code(mut self, code: AuthorizationCode) -> Self {
        self.auth_code = code;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError::EmptyDeviceName);
        }
        if self.device_name.len() > MAX_DEVICE_NAME_LEN {
            return Err(ConfigError::DeviceNameTooLong {
                len: self.device_name.len(),
                max: MAX_DEVICE_NAME_LEN,
            });
        }
        let AdvertisingInterval { min, max } = self.filtered_interval;
        if min < MIN_INTERVAL_UNITS || max > MAX_INTERVAL_UNITS || min > max {
            return Err(ConfigError::InvalidInterval { min, max });
        }
        Ok(())
    }
}

/// Every LE operation is supported; deleting bonds of other peers needs the
/// authorization code, deleting the requester's own bond does not.
pub fn default_bms_features() -> Features {
    Features {
        delete_requesting: OperationSupport::open(),
        delete_all: OperationSupport::with_authorization(),
        delete_rest: OperationSupport::with_authorization(),
    }
}
