// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use handlebars::Handlebars;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs, io};
use tracing::{debug, error};

pub use toml::de::Error as TomlDeError;

pub const NEXUS_DIR: &str = ".nexus";
pub const DEFAULT_CONFIG_DIR: &str = "config";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_CONFIG_FILENAME: &str = "config.toml";

/// Returns the home directory of the current user, or the current directory if it couldn't be determined.
pub fn must_get_home() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home,
        None => {
            error!("could not determine the home directory, falling back to the current directory");
            PathBuf::from(".")
        }
    }
}

pub trait NexusConfigTemplate: Serialize {
    fn template(&self) -> &'static str;

    fn format_to_string(&self) -> io::Result<String> {
        // note: the registry is created on demand as this is only ever called when the config gets saved
        let mut reg = Handlebars::new();
        // values such as urls must end up in the file verbatim rather than html-escaped
        reg.register_escape_fn(handlebars::no_escape);
        reg.render_template(self.template(), &self)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }

    fn format_to_writer<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let formatted = self.format_to_string()?;
        writer.write_all(formatted.as_bytes())
    }
}

/// Writes the templated config to the provided path, creating all parent directories if needed.
pub fn save_formatted_config_to_file<C, P>(config: &C, path: P) -> io::Result<()>
where
    C: NexusConfigTemplate,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    debug!("saving config file to {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    config.format_to_writer(file)
}

pub fn deserialize_config_from_toml_str<C>(raw: &str) -> Result<C, TomlDeError>
where
    C: DeserializeOwned,
{
    toml::from_str(raw)
}

pub fn read_config_from_toml_file<C, P>(path: P) -> io::Result<C>
where
    C: DeserializeOwned,
    P: AsRef<Path>,
{
    let content = fs::read_to_string(path)?;
    deserialize_config_from_toml_str(&content)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct DummyConfig {
        name: String,
        value: u32,
    }

    impl NexusConfigTemplate for DummyConfig {
        fn template(&self) -> &'static str {
            r#"
# some explanatory comment
name = '{{ name }}'
value = {{ value }}
"#
        }
    }

    #[test]
    fn templated_config_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILENAME);

        let config = DummyConfig {
            name: "foomp".to_string(),
            value: 42,
        };
        save_formatted_config_to_file(&config, &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("# some explanatory comment"));

        let loaded: DummyConfig = read_config_from_toml_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn malformed_config_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, "name = ").unwrap();

        let err = read_config_from_toml_file::<DummyConfig, _>(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
