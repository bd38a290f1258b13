use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::{models::Settings, validation::SettingsValidator};

/// Prefix for environment overrides, e.g. `PHPFCGI__DEFAULTS__FASTCGI_PORT=9001`.
pub const ENV_PREFIX: &str = "PHPFCGI";

/// Load settings from an optional file plus `PHPFCGI__*` environment overrides.
/// Supports multiple formats: YAML, JSON, TOML, etc.
///
/// Without a file, the built-in defaults are used and only the environment is consulted.
pub fn load_settings(settings_path: Option<&Path>) -> Result<Settings> {
    let mut builder = Config::builder();

    if let Some(path) = settings_path {
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            Some("ini") => FileFormat::Ini,
            _ => FileFormat::Toml, // Default to TOML
        };

        builder = builder.add_source(File::new(
            path.to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", path.display()))?,
            format,
        ));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("policy.extensions"),
        )
        .build()
        .context("Failed to build settings")?;

    let settings: Settings = settings.try_deserialize().with_context(|| match settings_path {
        Some(path) => format!("Failed to deserialize settings from {}", path.display()),
        None => "Failed to deserialize settings from environment".to_string(),
    })?;

    SettingsValidator::validate(&settings).context("Invalid settings")?;

    if let Some(path) = settings_path {
        tracing::debug!(path = %path.display(), "Loaded settings file");
    }

    Ok(settings)
}

/// Commented settings file written by `init-settings`. Values mirror [`Settings::default`].
pub const DEFAULT_SETTINGS_TOML: &str = r#"# php-fastcgi-gen settings
#
# Every key is optional. Environment variables override file values, e.g.
#   PHPFCGI__DEFAULTS__FASTCGI_PORT=9001

# Ports assumed when an address leaves them out
[defaults]
http_port = 80
https_port = 443
fastcgi_port = 9000

# Which files are scripts, and which one fronts a directory
[policy]
extensions = [".php"]
index_file = "index.php"

# Name of the emitted server entry
[server]
name = "proxy"

# Used by `php-fastcgi --load <admin-url>`
[admin_api]
timeout_secs = 10
"#;

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_toml_settings() {
        let toml_content = r#"
[defaults]
fastcgi_port = 9001

[policy]
extensions = [".php", ".phtml"]
index_file = "app.php"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let settings = load_settings(Some(temp_file.path())).unwrap();
        assert_eq!(settings.defaults.fastcgi_port, 9001);
        assert_eq!(settings.defaults.https_port, 443);
        assert_eq!(settings.policy.extensions, vec![".php", ".phtml"]);
        assert_eq!(settings.policy.index_file, "app.php");
        assert_eq!(settings.server.name, "proxy");
    }

    #[test]
    fn test_load_json_settings() {
        let json_content = r#"
{
  "server": { "name": "php" },
  "admin_api": { "timeout_secs": 3 }
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let settings = load_settings(Some(temp_file.path())).unwrap();
        assert_eq!(settings.server.name, "php");
        assert_eq!(settings.admin_api.timeout_secs, 3);
    }

    #[test]
    fn test_default_settings_file_round_trips_to_defaults() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", DEFAULT_SETTINGS_TOML).unwrap();

        let settings = load_settings(Some(temp_file.path())).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let toml_content = r#"
[policy]
extensions = ["php"]
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        assert!(load_settings(Some(temp_file.path())).is_err());
    }
}
