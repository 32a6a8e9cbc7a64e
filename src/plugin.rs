//! Lifecycle glue between the hook runner and the translator.
//!
//! A configuration change is handled by [`CinderHuaweiPlugin::on_config`]:
//! check the mandatory options, derive the backend, and produce the data
//! published on the `storage-backend` relation together with the unit status.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, json};
use tracing::{info, warn};

use crate::config_file::{ConfigInput, MANDATORY_CONFIG};
use crate::error::{BackendError, Result};
use crate::template::Renderer;
use crate::translator::{BackendOptions, ConfigTranslator, backend_name};
use crate::types::UnitStatus;
use crate::validator::{PresenceValidator, Validator};

/// Relation the principal reads backend configuration from
pub const STORAGE_BACKEND_RELATION: &str = "storage-backend";

/// Packages the unit needs before the driver can load
pub const PACKAGES: &[&str] = &["cinder-common", "sysfsutils"];

/// Principal-side file the options end up in
const CINDER_CONF: &str = "/etc/cinder/cinder.conf";

/// Data the plugin publishes to the principal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationData {
    pub backend_name: String,
    pub stateless: String,
    pub active_active: String,
    /// JSON document mapping the principal's config file to its new section
    pub subordinate_configuration: String,
}

impl RelationData {
    pub fn new(
        backend_name: String,
        options: &BackendOptions,
        stateless: bool,
        active_active: bool,
    ) -> Result<Self> {
        let mut sections = Map::new();
        sections.insert(backend_name.clone(), serde_json::to_value(options)?);
        let mut files = Map::new();
        files.insert(CINDER_CONF.to_string(), json!({ "sections": sections }));
        let subordinate_configuration = serde_json::to_string(&json!({ "cinder": files }))?;

        Ok(Self {
            backend_name,
            stateless: python_bool(stateless),
            active_active: python_bool(active_active),
            subordinate_configuration,
        })
    }
}

// The principal parses these flags from their capitalised spelling
fn python_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

/// Result of handling a configuration change
#[derive(Debug, Clone)]
pub enum ConfigOutcome {
    /// Options published and driver file written
    Ready {
        status: UnitStatus,
        relation: RelationData,
        options: BackendOptions,
        conf_file: PathBuf,
    },
    /// Mandatory options are missing; nothing was written
    Blocked { status: UnitStatus, missing: Vec<String> },
}

impl ConfigOutcome {
    pub fn status(&self) -> &UnitStatus {
        match self {
            Self::Ready { status, .. } | Self::Blocked { status, .. } => status,
        }
    }
}

/// The Huawei storage-backend plugin
#[derive(Debug, Clone)]
pub struct CinderHuaweiPlugin<R = crate::template::TemplateRenderer, V = PresenceValidator> {
    translator: ConfigTranslator<R>,
    validator: V,
    /// The driver keeps no per-node state, so any unit can serve a volume
    pub stateless: bool,
    pub active_active: bool,
}

impl<R: Renderer> CinderHuaweiPlugin<R, PresenceValidator> {
    pub fn new(translator: ConfigTranslator<R>) -> Self {
        Self::with_validator(translator, PresenceValidator)
    }
}

impl<R: Renderer, V: Validator> CinderHuaweiPlugin<R, V> {
    pub fn with_validator(translator: ConfigTranslator<R>, validator: V) -> Self {
        Self {
            translator,
            validator,
            stateless: true,
            active_active: false,
        }
    }

    pub fn translator(&self) -> &ConfigTranslator<R> {
        &self.translator
    }

    /// Distribution packages to install before the backend is configured
    pub fn packages(&self) -> &'static [&'static str] {
        PACKAGES
    }

    /// Handle a configuration change for application `app_name`.
    ///
    /// Missing options are not an error: they yield a Blocked outcome. Bad
    /// protocols and file-system failures are returned as errors.
    pub fn on_config(&self, config: &ConfigInput, app_name: &str) -> Result<ConfigOutcome> {
        match self.validator.check_mandatory(config, MANDATORY_CONFIG) {
            Ok(()) => {}
            Err(BackendError::Validation { missing }) => {
                let status = UnitStatus::missing(&missing);
                warn!("{}", status.message());
                return Ok(ConfigOutcome::Blocked { status, missing });
            }
            Err(e) => return Err(e),
        }

        let (options, conf_file) = self.translator.derive(config, app_name)?;
        let relation = self.relation_data(config, app_name, &options)?;
        info!(
            "Backend {} configured for {}",
            relation.backend_name, STORAGE_BACKEND_RELATION
        );

        Ok(ConfigOutcome::Ready {
            status: UnitStatus::ready(),
            relation,
            options,
            conf_file: conf_file.path,
        })
    }

    /// Build relation data for already-derived options
    pub fn relation_data(
        &self,
        config: &ConfigInput,
        app_name: &str,
        options: &BackendOptions,
    ) -> Result<RelationData> {
        RelationData::new(
            backend_name(config, app_name),
            options,
            self.stateless,
            self.active_active,
        )
    }
}
