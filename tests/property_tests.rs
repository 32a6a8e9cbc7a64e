//! Property-Based Tests
//!
//! These tests verify invariants over arbitrary inputs:
//! - Protocol string round-trips and driver selection
//! - Backend naming and option layout
//! - Rendered XML never leaks template syntax or unescaped markup

use proptest::prelude::*;

use cinder_huawei_backend::template::{DEFAULT_TEMPLATE, render_str};
use cinder_huawei_backend::translator::select_protocol;
use cinder_huawei_backend::{
    BackendError, ConfigInput, ConfigTranslator, DRIVER_FC, DRIVER_ISCSI, HuaweiContext, Protocol,
    TranslatorSettings,
};

fn protocol_strategy() -> impl Strategy<Value = Protocol> {
    prop_oneof![Just(Protocol::Iscsi), Just(Protocol::Fc)]
}

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

proptest! {
    /// Protocol: to_string → parse round-trip is identity
    #[test]
    fn protocol_roundtrip(protocol in protocol_strategy()) {
        let parsed: Protocol = protocol.to_string().parse().expect("Should parse");
        prop_assert_eq!(protocol, parsed);
    }

    /// The selected driver always matches the protocol
    #[test]
    fn driver_follows_protocol(protocol in protocol_strategy()) {
        let plan = translator().plan(&base_config(&protocol.to_string()), "app").unwrap();
        let expected = match protocol {
            Protocol::Iscsi => DRIVER_ISCSI,
            Protocol::Fc => DRIVER_FC,
        };
        prop_assert_eq!(plan.options.get_str("volume_driver"), Some(expected));
    }

    /// Anything other than the two supported names is rejected
    #[test]
    fn other_protocols_rejected(raw in "[a-zA-Z]{0,8}") {
        prop_assume!(raw != "iscsi" && raw != "fc");
        let result = select_protocol(&base_config(&raw));
        prop_assert!(matches!(result, Err(BackendError::UnsupportedProtocol(_))));
    }

    /// Backend name is the supplied value, or the app name when unset
    #[test]
    fn backend_name_resolution(
        app in "[a-z][a-z0-9-]{0,20}",
        name in proptest::option::of("[a-z_]{1,16}"),
    ) {
        let mut config = base_config("iscsi");
        if let Some(name) = &name {
            config.set("volume-backend-name", name.as_str());
        }
        let plan = translator().plan(&config, &app).unwrap();
        let expected = name.unwrap_or_else(|| app.clone());
        prop_assert_eq!(plan.options.get_str("volume_backend_name"), Some(expected.as_str()));

        let conf_file = format!("/etc/cinder/{app}/cinder_huawei_conf.xml");
        prop_assert_eq!(plan.options.get_str("cinder_huawei_conf_file"), Some(conf_file.as_str()));
    }

    /// Multipath flags appear together or not at all
    #[test]
    fn multipath_flags_paired(enabled in any::<bool>()) {
        let mut config = base_config("fc");
        config.set("use-multipath", enabled);
        let plan = translator().plan(&config, "app").unwrap();

        let expected_len = if enabled { 5 } else { 3 };
        prop_assert_eq!(plan.options.len(), expected_len);
        prop_assert_eq!(
            plan.options.get("use_multipath_for_image_xfer").is_some(),
            plan.options.get("enforce_multipath_for_image_xfer").is_some()
        );
    }

    /// User-supplied text cannot inject markup into the driver file
    #[test]
    fn rendered_values_are_escaped(password in "[^{}%]{0,32}", pool in "[<>&\"' a-z]{0,16}") {
        let mut config = base_config("iscsi");
        config.set("password", password.as_str()).set("storage-pool", pool.as_str());

        let xml = render_str(DEFAULT_TEMPLATE, &HuaweiContext::from_config(&config)).unwrap();
        prop_assert!(!xml.contains("{{"));
        prop_assert!(!xml.contains("{%"), "rendered output contains a template tag");

        let start = xml.find("<UserPassword>").unwrap() + "<UserPassword>".len();
        let end = xml.find("</UserPassword>").unwrap();
        let rendered = &xml[start..end];
        prop_assert!(!rendered.contains('<'));
        prop_assert!(!rendered.contains('>'));
    }
}
