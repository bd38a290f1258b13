//! Settings data structures for php-fastcgi-gen.
//!
//! These types map directly to TOML (also JSON / YAML) settings files. Every field has a
//! default so that running without a settings file behaves exactly like the built-in
//! policy: `.php` scripts, `index.php` as the front controller, ports 80 / 443 / 9000.
use serde::{Deserialize, Serialize};

/// Default port for plaintext HTTP listeners.
pub const DEFAULT_HTTP_PORT: u16 = 80;
/// Default port for TLS listeners.
pub const DEFAULT_HTTPS_PORT: u16 = 443;
/// Default port a PHP FastCGI process manager listens on.
pub const DEFAULT_FASTCGI_PORT: u16 = 9000;

/// Name of the single server entry in the emitted config.
pub const DEFAULT_SERVER_NAME: &str = "proxy";

/// Top level settings. All sections are optional.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Ports used when an address leaves them out
    pub defaults: ResolverDefaults,
    /// Script extension / index file policy
    pub policy: ExtensionPolicy,
    /// Emitted server options
    pub server: ServerSettings,
    /// Options for pushing the config to a running admin endpoint
    pub admin_api: AdminApiSettings,
}

/// Port constants the address resolver falls back to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverDefaults {
    pub http_port: u16,
    pub https_port: u16,
    pub fastcgi_port: u16,
}

impl Default for ResolverDefaults {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            https_port: DEFAULT_HTTPS_PORT,
            fastcgi_port: DEFAULT_FASTCGI_PORT,
        }
    }
}

/// Which files count as scripts and which one fronts a directory.
///
/// The redirect, rewrite and dispatch routes all derive from this one value, so the
/// three stages always agree on what a script is.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExtensionPolicy {
    /// Script extensions including the leading dot, e.g. `.php`
    pub extensions: Vec<String>,
    /// Index file tried for directory-style paths, e.g. `index.php`
    pub index_file: String,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self {
            extensions: vec![".php".to_string()],
            index_file: "index.php".to_string(),
        }
    }
}

impl ExtensionPolicy {
    /// Glob patterns matching request paths that end in a script extension.
    pub fn path_globs(&self) -> Vec<String> {
        self.extensions.iter().map(|ext| format!("*{ext}")).collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub name: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AdminApiSettings {
    /// Request timeout when posting a config to `--load`
    pub timeout_secs: u64,
}

impl Default for AdminApiSettings {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_php() {
        let policy = ExtensionPolicy::default();
        assert_eq!(policy.extensions, vec![".php"]);
        assert_eq!(policy.index_file, "index.php");
        assert_eq!(policy.path_globs(), vec!["*.php"]);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"defaults": {"fastcgi_port": 9001}}"#).unwrap();
        assert_eq!(settings.defaults.fastcgi_port, 9001);
        assert_eq!(settings.defaults.http_port, 80);
        assert_eq!(settings.defaults.https_port, 443);
        assert_eq!(settings.policy, ExtensionPolicy::default());
        assert_eq!(settings.server.name, "proxy");
    }
}
