/// Failures that abort the boot sequence before the idle loop
#[derive(thiserror::Error, Debug)]
pub enum BootError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Bluetooth init failed: {0}")]
    BluetoothInit(String),
    #[error("failed to init BMS: {0}")]
    Bms(String),
    #[error("advertising failed to start: {0}")]
    Advertising(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("device name is empty")]
    EmptyDeviceName,
    #[error("device name is {len} bytes, at most {max} fit in the advertising data")]
    DeviceNameTooLong { len: usize, max: usize },
    #[error("advertising interval {min}..{max} is out of range")]
    InvalidInterval { min: u16, max: u16 },
}
