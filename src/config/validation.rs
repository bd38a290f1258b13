#![allow(clippy::collapsible_if)]

use std::collections::HashSet;

use crate::{
    config::models::{ExtensionPolicy, ResolverDefaults, Settings},
    core::{
        assembler::{ServerSpec, TopLevelConfig},
        pipeline::{Handler, MatcherSet, RouteRule},
        routes::LOCATION_HEADER,
    },
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Settings validator
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate the entire settings tree
    pub fn validate(settings: &Settings) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(mut default_errors) = Self::validate_defaults(&settings.defaults) {
            errors.append(&mut default_errors);
        }

        if let Err(mut policy_errors) = Self::validate_policy(&settings.policy) {
            errors.append(&mut policy_errors);
        }

        if settings.server.name.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "server.name".to_string(),
            });
        }

        if settings.admin_api.timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "admin_api.timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        finish(errors)
    }

    fn validate_defaults(defaults: &ResolverDefaults) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (field, port) in [
            ("defaults.http_port", defaults.http_port),
            ("defaults.https_port", defaults.https_port),
            ("defaults.fastcgi_port", defaults.fastcgi_port),
        ] {
            if port == 0 {
                errors.push(ValidationError::InvalidField {
                    field: field.to_string(),
                    message: "Port must be greater than 0".to_string(),
                });
            }
        }

        if defaults.http_port == defaults.https_port {
            errors.push(ValidationError::InvalidField {
                field: "defaults.https_port".to_string(),
                message: format!(
                    "HTTP and HTTPS default ports must differ, both are {}",
                    defaults.http_port
                ),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The three routes only agree with each other if the index file is itself a script.
    pub fn validate_policy(policy: &ExtensionPolicy) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if policy.extensions.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "policy.extensions".to_string(),
            });
        }

        for ext in &policy.extensions {
            if ext.len() < 2 || !ext.starts_with('.') || ext[1..].contains(['.', '/', '*']) {
                errors.push(ValidationError::InvalidField {
                    field: "policy.extensions".to_string(),
                    message: format!(
                        "Extension '{ext}' must be a single dot followed by a name, e.g. '.php'"
                    ),
                });
            }
        }

        let index = policy.index_file.trim();
        if index.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "policy.index_file".to_string(),
            });
        } else if index.contains('/') {
            errors.push(ValidationError::InvalidField {
                field: "policy.index_file".to_string(),
                message: "Index file must be a file name, not a path".to_string(),
            });
        } else if !policy.extensions.iter().any(|ext| index.ends_with(ext.as_str())) {
            errors.push(ValidationError::InvalidField {
                field: "policy.index_file".to_string(),
                message: format!("Index file '{index}' does not end in a configured extension"),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Structural checks on an assembled config before it is handed to a runtime.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &TopLevelConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if config.servers.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "apps.http.servers".to_string(),
            });
        }

        for (name, server) in &config.servers {
            if name.trim().is_empty() {
                errors.push(ValidationError::MissingField {
                    field: "server name".to_string(),
                });
            }
            if let Err(mut server_errors) = Self::validate_server(name, server) {
                errors.append(&mut server_errors);
            }
        }

        finish(errors)
    }

    fn validate_server(name: &str, server: &ServerSpec) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if server.listen.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("server '{name}' listen"),
            });
        }
        for address in &server.listen {
            if let Err(e) = Self::validate_listen_address(address) {
                errors.push(e);
            }
        }

        for (i, rule) in server.pipeline.rules().into_iter().enumerate() {
            if let Err(mut rule_errors) = Self::validate_rule(name, i, rule) {
                errors.append(&mut rule_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate listen address format, ":PORT" with an optional host in front
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        let port = address.rsplit_once(':').map(|(_, port)| port);
        match port.map(str::parse::<u16>) {
            Some(Ok(port)) if port > 0 => Ok(()),
            _ => Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format ':PORT' (e.g., ':443' or ':8080')".to_string(),
            }),
        }
    }

    fn validate_rule(server: &str, index: usize, rule: &RouteRule) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let context = format!("server '{server}' route {}", index + 1);

        for set in &rule.matcher_sets {
            if let Err(e) = Self::validate_matcher_set(&context, set) {
                errors.push(e);
            }
        }

        if rule.handlers.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("{context} handle"),
            });
        }

        for handler in &rule.handlers {
            match handler {
                Handler::StaticResponse(response) => {
                    if response.status_code.is_redirection()
                        && !response.headers.contains_key(LOCATION_HEADER)
                    {
                        errors.push(ValidationError::InvalidField {
                            field: format!("{context} static_response"),
                            message: "Redirect responses need a Location header".to_string(),
                        });
                    }
                }
                Handler::Rewrite(rewrite) => {
                    if rewrite.uri.is_empty() {
                        errors.push(ValidationError::InvalidField {
                            field: format!("{context} rewrite.uri"),
                            message: "Rewrite URI cannot be empty".to_string(),
                        });
                    }
                }
                Handler::ReverseProxy(proxy) => {
                    if proxy.upstreams.is_empty() {
                        errors.push(ValidationError::MissingField {
                            field: format!("{context} upstreams"),
                        });
                    }
                    for upstream in &proxy.upstreams {
                        if upstream.dial.trim().is_empty() || upstream.dial.ends_with(':') {
                            errors.push(ValidationError::InvalidField {
                                field: format!("{context} upstream dial"),
                                message: format!("Invalid dial address '{}'", upstream.dial),
                            });
                        }
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Matcher names are object keys once serialized, so they must be unique per set
    fn validate_matcher_set(context: &str, set: &MatcherSet) -> ValidationResult<()> {
        let mut seen = HashSet::new();
        for matcher in set.matchers() {
            if !seen.insert(matcher.name()) {
                return Err(ValidationError::InvalidField {
                    field: format!("{context} match"),
                    message: format!("Matcher '{}' appears twice in one set", matcher.name()),
                });
            }
        }
        Ok(())
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::ValidationFailed {
            message: format_multiple_errors(errors),
        })
    }
}

/// Format multiple validation errors into a single message
fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
    if errors.is_empty() {
        return "No errors".to_string();
    }

    if errors.len() == 1 {
        return errors[0].to_string();
    }

    let mut message = format!("Found {} validation errors:\n", errors.len());
    for (i, error) in errors.iter().enumerate() {
        message.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        address::{Address, Scheme},
        assembler::PipelineAssembler,
        pipeline::{Matcher, Upstream},
        routes::RouteSynthesizer,
    };

    fn valid_config() -> TopLevelConfig {
        let policy = ExtensionPolicy::default();
        let upstream = Address {
            scheme: Scheme::FastCgi,
            host: "localhost".to_string(),
            port: 9000,
        };
        let downstream = Address {
            scheme: Scheme::Https,
            host: "app.example.com".to_string(),
            port: 443,
        };
        let pipeline = RouteSynthesizer::new(&policy).synthesize(&upstream, "/srv");
        PipelineAssembler::new("proxy").assemble(&downstream, pipeline)
    }

    #[test]
    fn default_settings_are_valid() {
        assert!(SettingsValidator::validate(&Settings::default()).is_ok());
    }

    #[test]
    fn rejects_extension_without_dot() {
        let policy = ExtensionPolicy {
            extensions: vec!["php".to_string()],
            index_file: "index.php".to_string(),
        };
        assert!(SettingsValidator::validate_policy(&policy).is_err());
    }

    #[test]
    fn rejects_index_file_outside_policy() {
        let policy = ExtensionPolicy {
            extensions: vec![".php".to_string()],
            index_file: "index.html".to_string(),
        };
        assert!(SettingsValidator::validate_policy(&policy).is_err());

        let policy = ExtensionPolicy {
            extensions: vec![".php".to_string()],
            index_file: "public/index.php".to_string(),
        };
        assert!(SettingsValidator::validate_policy(&policy).is_err());
    }

    #[test]
    fn rejects_equal_web_ports_and_reports_all_errors() {
        let mut settings = Settings::default();
        settings.defaults.https_port = 80;
        settings.defaults.fastcgi_port = 0;

        let err = SettingsValidator::validate(&settings).unwrap_err();
        assert!(err.to_string().contains("Found 2 validation errors"));
    }

    #[test]
    fn synthesized_config_is_valid() {
        assert!(ConfigValidator::validate(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_bad_listen_address() {
        let mut config = valid_config();
        if let Some(server) = config.servers.get_mut("proxy") {
            server.listen = vec![":".to_string()];
        }
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn rejects_empty_dial() {
        let mut config = valid_config();
        if let Some(server) = config.servers.get_mut("proxy") {
            if let Handler::ReverseProxy(proxy) = &mut server.pipeline.dispatch.handlers[0] {
                proxy.upstreams = vec![Upstream {
                    dial: String::new(),
                }];
            }
        }
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn rejects_duplicate_matcher_names() {
        let mut config = valid_config();
        if let Some(server) = config.servers.get_mut("proxy") {
            server.pipeline.dispatch.matcher_sets = vec![
                MatcherSet::new()
                    .with(Matcher::Path(vec!["*.php".to_string()]))
                    .with(Matcher::Path(vec!["*.phtml".to_string()])),
            ];
        }
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
