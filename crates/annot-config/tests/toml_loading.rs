//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed file and env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use annot_config::{AnnotConfig, ConfigError};
use pretty_assertions::assert_eq;

#[test]
fn loads_validation_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[validation]
coerce_scalars = false
max_depth = 4
check_payload_schema = false

[logging]
level = "debug"
"#,
        )?;

        let config: AnnotConfig = Figment::from(Serialized::defaults(AnnotConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert!(!config.validation.coerce_scalars);
        assert_eq!(config.validation.max_depth, 4);
        assert!(!config.validation.check_payload_schema);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.env_var, "ANNOT_LOG");
        Ok(())
    });
}

#[test]
fn partial_section_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r"
[validation]
max_depth = 8
",
        )?;

        let config: AnnotConfig = Figment::from(Serialized::defaults(AnnotConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.validation.max_depth, 8);
        assert!(config.validation.coerce_scalars);
        assert!(config.validation.check_payload_schema);
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".annot")?;
        jail.create_file(
            ".annot/config.toml",
            r"
[validation]
coerce_scalars = false
",
        )?;

        let config = AnnotConfig::load().map_err(|e| e.to_string())?;
        assert!(!config.validation.coerce_scalars);
        Ok(())
    });
}

#[test]
fn zero_depth_fails_on_load() {
    Jail::expect_with(|jail| {
        jail.create_dir(".annot")?;
        jail.create_file(
            ".annot/config.toml",
            r"
[validation]
max_depth = 0
",
        )?;

        let result = AnnotConfig::load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        Ok(())
    });
}

#[test]
fn from_figment_reads_an_explicit_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("annot.toml");
    std::fs::write(&path, "[validation]\nmax_depth = 2\n[logging]\nlevel = \"info\"\n")
        .expect("write config");

    let figment = Figment::from(Serialized::defaults(AnnotConfig::default())).merge(Toml::file(&path));
    let config = AnnotConfig::from_figment(&figment).expect("valid config");
    assert_eq!(config.validation.max_depth, 2);
    assert_eq!(config.logging.level, "info");
}
