//! The record rendered into the Huawei driver XML file.

use serde::Serialize;

use crate::config_file::{ConfigInput, ConfigValue};

/// Names a template may reference, in the order the driver file lists them
pub const CONTEXT_FIELDS: &[&str] = &[
    "protocol",
    "product",
    "username",
    "password",
    "rest_url",
    "storage_pool",
    "luntype",
    "default_targetip",
    "initiator_name",
    "target_portgroup",
    "fc_hostname",
    "alua",
    "failovermode",
    "pathtype",
];

/// Fixed-shape view of the options the Huawei driver reads from its XML file.
///
/// Every field is optional; how an unset field renders is up to the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HuaweiContext {
    pub protocol: Option<ConfigValue>,
    pub product: Option<ConfigValue>,
    pub username: Option<ConfigValue>,
    pub password: Option<ConfigValue>,
    pub rest_url: Option<ConfigValue>,
    pub storage_pool: Option<ConfigValue>,
    pub luntype: Option<ConfigValue>,
    pub default_targetip: Option<ConfigValue>,
    pub initiator_name: Option<ConfigValue>,
    pub target_portgroup: Option<ConfigValue>,
    pub fc_hostname: Option<ConfigValue>,
    pub alua: Option<ConfigValue>,
    pub failovermode: Option<ConfigValue>,
    pub pathtype: Option<ConfigValue>,
}

impl HuaweiContext {
    /// Extract the driver fields from operator configuration
    pub fn from_config(config: &ConfigInput) -> Self {
        let take = |key: &str| config.get(key).cloned();
        Self {
            protocol: take("protocol"),
            product: take("product"),
            username: take("username"),
            password: take("password"),
            rest_url: take("rest-url"),
            storage_pool: take("storage-pool"),
            luntype: take("luntype"),
            default_targetip: take("default-targetip"),
            initiator_name: take("initiator-name"),
            target_portgroup: take("target-portgroup"),
            fc_hostname: take("fc-hostname"),
            alua: take("alua"),
            failovermode: take("failover-mode"),
            pathtype: take("path-type"),
        }
    }

    /// Look up a field by its template name.
    ///
    /// Returns `None` for unknown names; `Some(None)` for known but unset ones.
    pub fn field(&self, name: &str) -> Option<Option<&ConfigValue>> {
        let value = match name {
            "protocol" => &self.protocol,
            "product" => &self.product,
            "username" => &self.username,
            "password" => &self.password,
            "rest_url" => &self.rest_url,
            "storage_pool" => &self.storage_pool,
            "luntype" => &self.luntype,
            "default_targetip" => &self.default_targetip,
            "initiator_name" => &self.initiator_name,
            "target_portgroup" => &self.target_portgroup,
            "fc_hostname" => &self.fc_hostname,
            "alua" => &self.alua,
            "failovermode" => &self.failovermode,
            "pathtype" => &self.pathtype,
            _ => return None,
        };
        Some(value.as_ref())
    }
}
