//! Huawei storage backend plugin for Cinder.
//!
//! This library turns the operator's flat option map into the Huawei driver
//! XML file and the ordered backend options a Cinder principal consumes.

pub mod cli;
pub mod config_file;
pub mod context;
pub mod error;
pub mod fs_util;
pub mod plugin;
pub mod template;
pub mod translator;
pub mod types;
pub mod validator;

// Re-export main types for convenience
pub use config_file::{ConfigInput, ConfigValue, MANDATORY_CONFIG};
pub use context::HuaweiContext;
pub use error::{BackendError, Result};
pub use fs_util::FileOwner;
pub use plugin::{CinderHuaweiPlugin, ConfigOutcome, RelationData};
pub use template::{Renderer, TemplateRenderer, TemplateSource};
pub use translator::{
    BackendOptions, ConfigTranslator, DriverConfigFile, RenderPlan, TranslatorSettings,
};
pub use types::{DRIVER_FC, DRIVER_ISCSI, Protocol, UnitStatus};
pub use validator::{PresenceValidator, Validator};
