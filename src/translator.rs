//! Translation of operator configuration into the Huawei backend.
//!
//! [`ConfigTranslator::derive`] is the whole contract: pick the driver from
//! the protocol, render the driver XML into a per-application directory and
//! return the ordered options the principal writes into its own config.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::ser::{SerializeSeq, Serializer};
use serde_json::Value;
use tracing::{debug, info};

use crate::config_file::ConfigInput;
use crate::context::HuaweiContext;
use crate::error::{BackendError, Result};
use crate::fs_util::{self, FileOwner};
use crate::template::{Renderer, TemplateRenderer, TemplateSource};
use crate::types::Protocol;

/// Name of the rendered driver configuration file
pub const HUAWEI_CONF_FILE: &str = "cinder_huawei_conf.xml";

/// Directory under which each application gets its own subdirectory
pub const DEFAULT_BASE_DIR: &str = "/etc/cinder";

/// Mode of the rendered driver configuration file
pub const CONF_FILE_MODE: u32 = 0o644;

/// Mode given to a freshly created per-application directory
pub const CONF_DIR_MODE: u32 = 0o755;

/// Ordered `(key, value)` pairs handed to the principal.
///
/// Serializes as a list of two-element arrays so the order survives JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendOptions(Vec<(String, Value)>);

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.push((key.into(), value.into()));
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for BackendOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for pair in &self.0 {
            seq.serialize_element(pair)?;
        }
        seq.end()
    }
}

/// The rendered driver configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfigFile {
    pub path: PathBuf,
}

/// Everything `derive` would produce, computed without touching the disk
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub options: BackendOptions,
    pub path: PathBuf,
    pub content: Vec<u8>,
}

/// Where and how the driver configuration is written
#[derive(Debug, Clone)]
pub struct TranslatorSettings {
    pub base_dir: PathBuf,
    /// `None` leaves ownership to the invoking user
    pub owner: Option<FileOwner>,
    pub file_mode: u32,
    pub dir_mode: u32,
    pub template: TemplateSource,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            owner: Some(FileOwner::default()),
            file_mode: CONF_FILE_MODE,
            dir_mode: CONF_DIR_MODE,
            template: TemplateSource::Embedded,
        }
    }
}

impl TranslatorSettings {
    /// Settings rooted at `base_dir` without changing ownership
    pub fn unowned(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            owner: None,
            ..Self::default()
        }
    }
}

/// Turns operator configuration into backend options and a driver file
#[derive(Debug, Clone)]
pub struct ConfigTranslator<R = TemplateRenderer> {
    settings: TranslatorSettings,
    renderer: R,
}

impl ConfigTranslator<TemplateRenderer> {
    pub fn new(settings: TranslatorSettings) -> Self {
        Self::with_renderer(settings, TemplateRenderer)
    }
}

impl Default for ConfigTranslator<TemplateRenderer> {
    fn default() -> Self {
        Self::new(TranslatorSettings::default())
    }
}

impl<R: Renderer> ConfigTranslator<R> {
    pub fn with_renderer(settings: TranslatorSettings, renderer: R) -> Self {
        Self { settings, renderer }
    }

    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    /// `{base_dir}/{app_name}/cinder_huawei_conf.xml`
    pub fn conf_file_path(&self, app_name: &str) -> PathBuf {
        self.settings.base_dir.join(app_name).join(HUAWEI_CONF_FILE)
    }

    /// Render everything in memory; no file-system side effects.
    pub fn plan(&self, config: &ConfigInput, app_name: &str) -> Result<RenderPlan> {
        validate_app_name(app_name)?;
        let protocol = select_protocol(config)?;
        let backend_name = backend_name(config, app_name);
        let path = self.conf_file_path(app_name);
        debug!("Using volume_driver={}", protocol.volume_driver());

        let template = self.settings.template.load()?;
        let context = HuaweiContext::from_config(config);
        let content = self.renderer.render(&template, &context)?;

        let mut options = BackendOptions::new();
        options.push("volume_driver", protocol.volume_driver());
        options.push("volume_backend_name", backend_name);
        options.push("cinder_huawei_conf_file", path.display().to_string());
        if config.is_enabled("use-multipath") {
            options.push("use_multipath_for_image_xfer", true);
            options.push("enforce_multipath_for_image_xfer", true);
        }

        Ok(RenderPlan {
            options,
            path,
            content,
        })
    }

    /// Render the driver file for `app_name` and return the backend options.
    ///
    /// Fails before touching the disk when the protocol or template is bad.
    pub fn derive(
        &self,
        config: &ConfigInput,
        app_name: &str,
    ) -> Result<(BackendOptions, DriverConfigFile)> {
        let plan = self.plan(config, app_name)?;
        self.write(&plan)?;
        info!(
            "Rendered {:?} for backend {}",
            plan.path,
            plan.options.get_str("volume_backend_name").unwrap_or(app_name)
        );
        Ok((plan.options, DriverConfigFile { path: plan.path }))
    }

    fn write(&self, plan: &RenderPlan) -> Result<()> {
        let owner = self.settings.owner.as_ref();
        let dir = plan.path.parent().ok_or_else(|| {
            BackendError::config(format!("{:?} has no parent directory", plan.path))
        })?;
        fs_util::ensure_dir(dir, self.settings.dir_mode, owner)?;
        fs_util::write_atomic(&plan.path, &plan.content, self.settings.file_mode, owner)
    }
}

/// Map `protocol` to its enum, failing on anything unsupported
pub fn select_protocol(config: &ConfigInput) -> Result<Protocol> {
    let raw = config.get_text("protocol");
    raw.as_deref()
        .and_then(|p| p.parse().ok())
        .ok_or(BackendError::UnsupportedProtocol(raw))
}

/// `volume-backend-name` when set, otherwise the application name
pub fn backend_name(config: &ConfigInput, app_name: &str) -> String {
    config
        .get_non_blank("volume-backend-name")
        .map(ToString::to_string)
        .unwrap_or_else(|| app_name.to_string())
}

fn validate_app_name(app_name: &str) -> Result<()> {
    let component = Path::new(app_name);
    let single = component.components().count() == 1
        && component.file_name().is_some_and(|n| n == app_name);
    if app_name.trim().is_empty() || !single {
        return Err(BackendError::config(format!(
            "application name '{app_name}' is not a single path component"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DRIVER_FC, DRIVER_ISCSI};

    const APP: &str = "fe-staging-cinder-huawei";

    fn base_config(protocol: &str) -> ConfigInput {
        [
            ("protocol", protocol),
            ("product", "Dorado"),
            ("username", "myuser"),
            ("password", "mypassword"),
            ("storage-pool", "mystoragepool"),
            ("rest-url", "https://example.com:8088/deviceManager/rest/"),
        ]
        .into_iter()
        .collect()
    }

    fn translator() -> ConfigTranslator {
        ConfigTranslator::new(TranslatorSettings::unowned("/etc/cinder"))
    }

    #[test]
    fn test_plan_selects_driver() {
        let plan = translator().plan(&base_config("iscsi"), APP).unwrap();
        assert_eq!(plan.options.get_str("volume_driver"), Some(DRIVER_ISCSI));

        let plan = translator().plan(&base_config("fc"), APP).unwrap();
        assert_eq!(plan.options.get_str("volume_driver"), Some(DRIVER_FC));
    }

    #[test]
    fn test_unsupported_protocol() {
        let err = select_protocol(&base_config("nvme")).unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedProtocol(Some(ref p)) if p == "nvme"));

        let err = select_protocol(&ConfigInput::new()).unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedProtocol(None)));
    }

    #[test]
    fn test_backend_name_defaults_to_app() {
        let mut config = base_config("iscsi");
        assert_eq!(backend_name(&config, APP), APP);

        config.set("volume-backend-name", "");
        assert_eq!(backend_name(&config, APP), APP);

        config.set("volume-backend-name", "huawei_dorado_iscsi");
        assert_eq!(backend_name(&config, APP), "huawei_dorado_iscsi");
    }

    #[test]
    fn test_option_order() {
        let mut config = base_config("iscsi");
        config.set("use-multipath", true);
        let plan = translator().plan(&config, APP).unwrap();

        let keys: Vec<&str> = plan.options.keys().collect();
        assert_eq!(
            keys,
            [
                "volume_driver",
                "volume_backend_name",
                "cinder_huawei_conf_file",
                "use_multipath_for_image_xfer",
                "enforce_multipath_for_image_xfer",
            ]
        );
        assert_eq!(plan.options.get("use_multipath_for_image_xfer"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_conf_file_path() {
        assert_eq!(
            translator().conf_file_path(APP),
            PathBuf::from("/etc/cinder/fe-staging-cinder-huawei/cinder_huawei_conf.xml")
        );
    }

    #[test]
    fn test_app_name_must_be_one_component() {
        for bad in ["", "  ", "..", ".", "a/b", "/abs"] {
            let err = translator().plan(&base_config("iscsi"), bad).unwrap_err();
            assert!(matches!(err, BackendError::Config(_)), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_options_serialize_in_order() {
        let mut options = BackendOptions::new();
        options.push("b", "x");
        options.push("a", true);
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"[["b","x"],["a",true]]"#);
    }
}
