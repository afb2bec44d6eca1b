// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter configuration.
//!
//! Configuration is layered: the embedded default config, then the repository config file (or
//! an explicitly passed one), then environment variables.

use crate::errors::ConfigParseError;
use camino::Utf8Path;
use config::{
    Case, Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState,
};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Settings which control how artifacts are reconciled.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct AdapterConfig {
    /// Fail every test case when a memory leak dump is found in standard output.
    pub fail_test_on_memory_leak: bool,

    /// The name of the root test suite.
    pub master_test_suite_name: String,

    /// Whether captured standard output is parsed.
    pub enable_stdout_redirection: bool,

    /// Whether captured standard error is parsed.
    pub enable_stderr_redirection: bool,
}

impl AdapterConfig {
    /// The default location of the config within a directory.
    pub const CONFIG_PATH: &'static str = ".config/boost-test-adapter.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Environment configuration uses this prefix, plus a _.
    pub const ENVIRONMENT_PREFIX: &'static str = "BOOST_TEST_ADAPTER";

    /// Reads the config from `config_file`, or if not specified from `.config/boost-test-adapter.toml`
    /// under `root`.
    ///
    /// An explicitly specified file must exist. Environment variables take precedence over both.
    pub fn from_sources(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_impl(root, config_file, |config_file, unknown| {
            for key in unknown {
                tracing::warn!(
                    %key,
                    config_file = %config_file,
                    "ignoring unknown configuration key"
                );
            }
        })
    }

    fn from_sources_impl(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
        unknown_callback: impl FnOnce(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config()
            .add_source(source)
            .add_source(
                Environment::with_prefix(Self::ENVIRONMENT_PREFIX)
                    .prefix_separator("_")
                    .convert_case(Case::Kebab)
                    .try_parsing(true),
            );

        Self::build_and_deserialize(&builder, &config_file, unknown_callback)
    }

    /// Returns the default config.
    pub fn default_config() -> Self {
        let builder = Self::make_default_config();
        Self::build_and_deserialize(&builder, Utf8Path::new("<default config>"), |_, _| {})
            .expect("default config is always valid")
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize(
        builder: &ConfigBuilder<DefaultState>,
        config_file: &Utf8Path,
        unknown_callback: impl FnOnce(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let config = builder
            .build_cloned()
            .map_err(|err| ConfigParseError::new(config_file, err))?;

        let mut unknown = BTreeSet::new();
        let this: Self = serde_ignored::deserialize(config, |path| {
            unknown.insert(path.to_string());
        })
        .map_err(|err| ConfigParseError::new(config_file, err))?;

        // The log filter variable shares the environment prefix.
        unknown.remove("log");
        if !unknown.is_empty() {
            unknown_callback(config_file, &unknown);
        }

        Ok(this)
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_is_valid() {
        let config = AdapterConfig::default_config();
        assert_eq!(
            config,
            AdapterConfig {
                fail_test_on_memory_leak: false,
                master_test_suite_name: "Master Test Suite".to_owned(),
                enable_stdout_redirection: true,
                enable_stderr_redirection: true,
            }
        );
    }

    #[test]
    fn repository_config_overrides_defaults() {
        let dir = Utf8TempDir::new().unwrap();
        fs_err::create_dir_all(dir.path().join(".config")).unwrap();
        fs_err::write(
            dir.path().join(AdapterConfig::CONFIG_PATH),
            indoc! {r#"
                fail-test-on-memory-leak = true
                master-test-suite-name = "MyModule"
            "#},
        )
        .unwrap();

        let config = AdapterConfig::from_sources(dir.path(), None).unwrap();
        assert!(config.fail_test_on_memory_leak);
        assert_eq!(config.master_test_suite_name, "MyModule");
        assert!(config.enable_stdout_redirection);
    }

    #[test]
    fn missing_repository_config_uses_defaults() {
        let dir = Utf8TempDir::new().unwrap();
        let config = AdapterConfig::from_sources(dir.path(), None).unwrap();
        assert_eq!(config.master_test_suite_name, "Master Test Suite");
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = Utf8TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = AdapterConfig::from_sources(dir.path(), Some(&missing)).unwrap_err();
        assert_eq!(err.config_file(), &missing);
    }

    #[test]
    fn invalid_value_is_an_error() {
        let dir = Utf8TempDir::new().unwrap();
        let file = dir.path().join("bad.toml");
        fs_err::write(&file, "enable-stderr-redirection = \"sometimes\"\n").unwrap();
        let err = AdapterConfig::from_sources(dir.path(), Some(&file)).unwrap_err();
        assert_eq!(err.config_file(), &file);
    }

    #[test]
    fn unknown_keys_are_reported() {
        let dir = Utf8TempDir::new().unwrap();
        let file = dir.path().join("extra.toml");
        fs_err::write(
            &file,
            indoc! {r#"
                fail-test-on-memory-leak = true
                catch-system-errors = false
                [report]
                level = "detailed"
            "#},
        )
        .unwrap();

        let mut reported = None;
        let config = AdapterConfig::from_sources_impl(dir.path(), Some(&file), |path, unknown| {
            reported = Some((path.to_owned(), unknown.clone()));
        })
        .unwrap();

        assert!(config.fail_test_on_memory_leak);
        let (path, unknown) = reported.expect("unknown keys were reported");
        assert_eq!(path, file);
        assert_eq!(
            unknown.into_iter().collect::<Vec<_>>(),
            vec!["catch-system-errors".to_owned(), "report".to_owned()]
        );
    }
}
