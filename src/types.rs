//! Typed values for the plugin's stringly-typed inputs and outputs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Fully-qualified Cinder driver for the iSCSI protocol
pub const DRIVER_ISCSI: &str = "cinder.volume.drivers.huawei.huawei_driver.HuaweiISCSIDriver";

/// Fully-qualified Cinder driver for the Fibre Channel protocol
pub const DRIVER_FC: &str = "cinder.volume.drivers.huawei.huawei_driver.HuaweiFCDriver";

/// Storage access protocol selected by the `protocol` option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[strum(serialize = "iscsi")]
    Iscsi,
    #[strum(serialize = "fc")]
    Fc,
}

impl Protocol {
    /// Driver class Cinder loads for this protocol
    pub const fn volume_driver(self) -> &'static str {
        match self {
            Self::Iscsi => DRIVER_ISCSI,
            Self::Fc => DRIVER_FC,
        }
    }
}

/// Unit status reported back to the lifecycle framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    Active(String),
    Blocked(String),
}

impl UnitStatus {
    pub fn ready() -> Self {
        Self::Active("Unit is ready".to_string())
    }

    pub fn missing(keys: &[String]) -> Self {
        Self::Blocked(format!("Missing option(s): {}", keys.join(", ")))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Active(msg) | Self::Blocked(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_protocol_parse_is_exact() {
        assert_eq!(Protocol::from_str("iscsi").unwrap(), Protocol::Iscsi);
        assert_eq!(Protocol::from_str("fc").unwrap(), Protocol::Fc);
        assert!(Protocol::from_str("ISCSI").is_err());
        assert!(Protocol::from_str("nvme").is_err());
        assert!(Protocol::from_str("").is_err());
    }

    #[test]
    fn test_every_protocol_has_a_driver() {
        for protocol in Protocol::iter() {
            let driver = protocol.volume_driver();
            assert!(driver.starts_with("cinder.volume.drivers.huawei.huawei_driver."));
        }
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(UnitStatus::ready().message(), "Unit is ready");
        let blocked = UnitStatus::missing(&["protocol".to_string(), "product".to_string()]);
        assert!(!blocked.is_active());
        assert_eq!(blocked.message(), "Missing option(s): protocol, product");
    }
}
