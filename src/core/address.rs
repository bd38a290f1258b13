//! Address parsing and role-specific defaulting.
//!
//! Both the public listener address (`--from`) and the FastCGI upstream (`--to`) are
//! given loosely: `app.example.com`, `:9000`, `http://localhost:1234`,
//! `unix:///run/php/php-fpm.sock`. [`AddressResolver`] parses them with one parser and
//! fills in the missing scheme and port according to the [`Role`] of the address.
use std::fmt;

use thiserror::Error;

use crate::{config::models::ResolverDefaults, core::error::SynthesisError};

/// Which side of the proxy an address describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Public-facing address clients connect to
    Downstream,
    /// Address of the PHP FastCGI process
    Upstream,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Downstream => write!(f, "downstream"),
            Role::Upstream => write!(f, "upstream"),
        }
    }
}

/// Scheme of a resolved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    /// FastCGI over TCP
    FastCgi,
    /// FastCGI over a unix domain socket
    Unix,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::FastCgi => "fastcgi",
            Scheme::Unix => "unix",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural problems found while parsing an address string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AddressError {
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("missing ']' in address '{0}'")]
    UnclosedBracket(String),

    #[error("unexpected characters after ']' in address '{0}'")]
    UnexpectedAfterBracket(String),

    #[error("unix socket path is empty")]
    EmptySocketPath,

    #[error("unsupported scheme '{0}': use 'http' or 'https'")]
    UnsupportedScheme(String),

    #[error("scheme '{scheme}' and port {port} violate convention")]
    SchemePortConflict { scheme: String, port: u16 },
}

/// Raw parse result before any defaulting is applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedAddress {
    pub scheme: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
}

impl ParsedAddress {
    /// Parse `[scheme://][host][:port][/path]`.
    ///
    /// For the `unix` scheme everything after `://` is the socket path and is kept in
    /// `host`; no port or path is split off.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let raw = raw.trim();

        let (scheme, remaining) = match raw.split_once("://") {
            Some((scheme, rest)) => (Some(scheme.to_ascii_lowercase()), rest),
            None => (None, raw),
        };
        let scheme = scheme.filter(|s| !s.is_empty());

        if scheme.as_deref() == Some(Scheme::Unix.as_str()) {
            if remaining.is_empty() {
                return Err(AddressError::EmptySocketPath);
            }
            return Ok(Self {
                scheme,
                host: remaining.to_string(),
                port: None,
                path: String::new(),
            });
        }

        let (authority, path) = match remaining.split_once('/') {
            Some((authority, rest)) => (authority, format!("/{rest}")),
            None => (remaining, String::new()),
        };

        let (host, port) = split_host_port(authority)?;
        let port = match port {
            Some(port) if !port.is_empty() => Some(
                port.parse::<u16>()
                    .map_err(|_| AddressError::InvalidPort(port.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            path,
        })
    }
}

/// Split `host[:port]`, accepting `[v6]:port` and bare unbracketed IPv6 literals.
fn split_host_port(authority: &str) -> Result<(&str, Option<&str>), AddressError> {
    if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| AddressError::UnclosedBracket(authority.to_string()))?;
        if after.is_empty() {
            return Ok((host, None));
        }
        return match after.strip_prefix(':') {
            Some(port) => Ok((host, Some(port))),
            None => Err(AddressError::UnexpectedAfterBracket(authority.to_string())),
        };
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => Ok((host, Some(port))),
        // zero colons, or an IPv6 literal without brackets
        _ => Ok((authority, None)),
    }
}

/// Join a host and port, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// A fully resolved address. Paths are rejected during resolution, so there is none here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub scheme: Scheme,
    /// Hostname or IP; the socket path for [`Scheme::Unix`]
    pub host: String,
    pub port: u16,
}

impl Address {
    /// Socket address a listener binds to: all interfaces on the resolved port.
    pub fn listen_address(&self) -> String {
        format!(":{}", self.port)
    }

    /// Target a reverse proxy dials to reach this address.
    pub fn dial_address(&self) -> String {
        match self.scheme {
            Scheme::Unix => format!("unix/{}", self.host),
            _ => join_host_port(&self.host, self.port),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme {
            Scheme::Unix => write!(f, "unix/{}", self.host),
            scheme => write!(f, "{scheme}://{}", join_host_port(&self.host, self.port)),
        }
    }
}

/// Turns raw address strings into [`Address`]es using a set of default ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressResolver {
    defaults: ResolverDefaults,
}

impl AddressResolver {
    pub fn new(defaults: ResolverDefaults) -> Self {
        Self { defaults }
    }

    /// Parse `raw` and apply the defaulting rules for `role`.
    ///
    /// Downstream: the port follows the scheme (http → HTTP port, https → HTTPS port). A
    /// missing scheme becomes `http` on the HTTP port or without a hostname (no hostname,
    /// no certificate), otherwise `https`.
    ///
    /// Upstream: the port defaults to the FastCGI port and the scheme must be omitted
    /// (TCP FastCGI) or `unix`.
    pub fn resolve(&self, raw: &str, role: Role) -> Result<Address, SynthesisError> {
        let parsed = ParsedAddress::parse(raw).map_err(|source| SynthesisError::InvalidAddress {
            role,
            address: raw.to_string(),
            source,
        })?;

        if !parsed.path.is_empty() {
            return Err(SynthesisError::PathNotAllowed {
                address: raw.to_string(),
            });
        }

        let address = match role {
            Role::Downstream => self.resolve_downstream(raw, parsed)?,
            Role::Upstream => self.resolve_upstream(parsed)?,
        };

        tracing::debug!(
            %role,
            raw,
            scheme = %address.scheme,
            host = %address.host,
            port = address.port,
            "Resolved address"
        );

        Ok(address)
    }

    fn resolve_downstream(
        &self,
        raw: &str,
        parsed: ParsedAddress,
    ) -> Result<Address, SynthesisError> {
        let invalid = |source| SynthesisError::InvalidAddress {
            role: Role::Downstream,
            address: raw.to_string(),
            source,
        };

        let scheme = match parsed.scheme.as_deref() {
            None => None,
            Some("http") => Some(Scheme::Http),
            Some("https") => Some(Scheme::Https),
            Some(other) => return Err(invalid(AddressError::UnsupportedScheme(other.to_string()))),
        };

        if let (Some(scheme), Some(port)) = (scheme, parsed.port) {
            let conflicting = (scheme == Scheme::Http && port == self.defaults.https_port)
                || (scheme == Scheme::Https && port == self.defaults.http_port);
            if conflicting {
                return Err(invalid(AddressError::SchemePortConflict {
                    scheme: scheme.to_string(),
                    port,
                }));
            }
        }

        let port = parsed
            .port
            .or_else(|| scheme.map(|scheme| self.web_port(scheme)));

        let scheme = scheme.unwrap_or_else(|| {
            if port == Some(self.defaults.http_port) || parsed.host.is_empty() {
                Scheme::Http
            } else {
                Scheme::Https
            }
        });

        Ok(Address {
            scheme,
            port: port.unwrap_or_else(|| self.web_port(scheme)),
            host: parsed.host,
        })
    }

    fn resolve_upstream(&self, parsed: ParsedAddress) -> Result<Address, SynthesisError> {
        let scheme = match parsed.scheme.as_deref() {
            None => Scheme::FastCgi,
            Some("unix") => Scheme::Unix,
            Some(other) => {
                return Err(SynthesisError::InvalidUpstreamScheme {
                    scheme: other.to_string(),
                });
            }
        };

        Ok(Address {
            scheme,
            host: parsed.host,
            port: parsed.port.unwrap_or(self.defaults.fastcgi_port),
        })
    }

    fn web_port(&self, scheme: Scheme) -> u16 {
        match scheme {
            Scheme::Http => self.defaults.http_port,
            _ => self.defaults.https_port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AddressResolver {
        AddressResolver::default()
    }

    #[test]
    fn parse_splits_scheme_host_port_and_path() {
        let parsed = ParsedAddress::parse("https://example.com:8443/app").unwrap();
        assert_eq!(parsed.scheme.as_deref(), Some("https"));
        assert_eq!(parsed.host, "example.com");
        assert_eq!(parsed.port, Some(8443));
        assert_eq!(parsed.path, "/app");
    }

    #[test]
    fn parse_handles_ipv6_forms() {
        let bracketed = ParsedAddress::parse("[::1]:9001").unwrap();
        assert_eq!(bracketed.host, "::1");
        assert_eq!(bracketed.port, Some(9001));

        let bare = ParsedAddress::parse("::1").unwrap();
        assert_eq!(bare.host, "::1");
        assert_eq!(bare.port, None);

        assert!(matches!(
            ParsedAddress::parse("[::1"),
            Err(AddressError::UnclosedBracket(_))
        ));
        assert!(matches!(
            ParsedAddress::parse("[::1]x"),
            Err(AddressError::UnexpectedAfterBracket(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_ports() {
        assert_eq!(
            ParsedAddress::parse("localhost:http"),
            Err(AddressError::InvalidPort("http".to_string()))
        );
        assert!(ParsedAddress::parse("localhost:70000").is_err());
    }

    #[test]
    fn parse_keeps_unix_socket_path_whole() {
        let parsed = ParsedAddress::parse("unix:///run/php/php-fpm.sock").unwrap();
        assert_eq!(parsed.scheme.as_deref(), Some("unix"));
        assert_eq!(parsed.host, "/run/php/php-fpm.sock");
        assert!(parsed.path.is_empty());

        assert_eq!(
            ParsedAddress::parse("unix://"),
            Err(AddressError::EmptySocketPath)
        );
    }

    #[test]
    fn downstream_named_host_defaults_to_https() {
        let addr = resolver()
            .resolve("app.example.com", Role::Downstream)
            .unwrap();
        assert_eq!(addr.scheme, Scheme::Https);
        assert_eq!(addr.port, 443);
        assert_eq!(addr.host, "app.example.com");
    }

    #[test]
    fn downstream_http_port_means_http() {
        let addr = resolver()
            .resolve("app.example.com:80", Role::Downstream)
            .unwrap();
        assert_eq!(addr.scheme, Scheme::Http);
        assert_eq!(addr.port, 80);

        let addr = resolver()
            .resolve("app.example.com:8080", Role::Downstream)
            .unwrap();
        assert_eq!(addr.scheme, Scheme::Https);
    }

    #[test]
    fn downstream_without_host_is_always_http() {
        for raw in ["", ":443", ":8080", ":80"] {
            let addr = resolver().resolve(raw, Role::Downstream).unwrap();
            assert_eq!(addr.scheme, Scheme::Http, "address {raw:?}");
        }
        assert_eq!(resolver().resolve("", Role::Downstream).unwrap().port, 80);
    }

    #[test]
    fn downstream_explicit_scheme_sets_port() {
        let addr = resolver()
            .resolve("http://localhost", Role::Downstream)
            .unwrap();
        assert_eq!((addr.scheme, addr.port), (Scheme::Http, 80));

        let addr = resolver()
            .resolve("https://localhost", Role::Downstream)
            .unwrap();
        assert_eq!((addr.scheme, addr.port), (Scheme::Https, 443));
    }

    #[test]
    fn downstream_rejects_conflicting_and_foreign_schemes() {
        assert!(matches!(
            resolver().resolve("http://localhost:443", Role::Downstream),
            Err(SynthesisError::InvalidAddress { .. })
        ));
        assert!(matches!(
            resolver().resolve("https://localhost:80", Role::Downstream),
            Err(SynthesisError::InvalidAddress { .. })
        ));
        assert!(matches!(
            resolver().resolve("ftp://localhost", Role::Downstream),
            Err(SynthesisError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn upstream_defaults_to_fastcgi_on_9000() {
        let addr = resolver().resolve("localhost", Role::Upstream).unwrap();
        assert_eq!(addr.scheme, Scheme::FastCgi);
        assert_eq!(addr.port, 9000);
        assert_eq!(addr.dial_address(), "localhost:9000");
    }

    #[test]
    fn upstream_scheme_must_be_omitted_or_unix() {
        let addr = resolver()
            .resolve("unix:///run/php/php-fpm.sock", Role::Upstream)
            .unwrap();
        assert_eq!(addr.scheme, Scheme::Unix);
        assert_eq!(addr.dial_address(), "unix//run/php/php-fpm.sock");

        for raw in ["http://localhost", "https://localhost:9000", "fastcgi://localhost"] {
            assert!(
                matches!(
                    resolver().resolve(raw, Role::Upstream),
                    Err(SynthesisError::InvalidUpstreamScheme { .. })
                ),
                "address {raw:?}"
            );
        }
    }

    #[test]
    fn paths_are_rejected_for_both_roles() {
        for role in [Role::Downstream, Role::Upstream] {
            assert!(matches!(
                resolver().resolve("localhost:9000/index.php", role),
                Err(SynthesisError::PathNotAllowed { .. })
            ));
            assert!(matches!(
                resolver().resolve("localhost/", role),
                Err(SynthesisError::PathNotAllowed { .. })
            ));
        }
    }

    #[test]
    fn custom_defaults_are_honoured() {
        let resolver = AddressResolver::new(ResolverDefaults {
            http_port: 8080,
            https_port: 8443,
            fastcgi_port: 9001,
        });

        let down = resolver.resolve("app.example.com:8080", Role::Downstream).unwrap();
        assert_eq!(down.scheme, Scheme::Http);

        let down = resolver.resolve("app.example.com", Role::Downstream).unwrap();
        assert_eq!(down.port, 8443);

        let up = resolver.resolve("php", Role::Upstream).unwrap();
        assert_eq!(up.port, 9001);
    }

    #[test]
    fn ipv6_upstream_is_bracketed_when_dialed() {
        let addr = resolver().resolve("[::1]:9001", Role::Upstream).unwrap();
        assert_eq!(addr.dial_address(), "[::1]:9001");
        assert_eq!(addr.to_string(), "fastcgi://[::1]:9001");
    }
}
