//! Typed route model for the emitted configuration.
//!
//! A [`RouteRule`] pairs OR-ed [`MatcherSet`]s with handlers. Handlers are a closed sum
//! type: a PHP front end only ever needs a static response, a rewrite, or a reverse
//! proxy dispatch. Everything serializes to the JSON layout an HTTP runtime with
//! `subroute` / `file` matcher support loads.
use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Serialize, Serializer, ser::SerializeMap};

/// Placeholder for the request path at evaluation time.
pub const REQUEST_PATH: &str = "{http.request.uri.path}";
/// Placeholder for the file a `file` matcher resolved, relative to the root.
pub const MATCHED_FILE_RELATIVE: &str = "{http.matchers.file.relative}";

/// One conditional stage: applies when any matcher set matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRule {
    #[serde(rename = "match", skip_serializing_if = "Vec::is_empty")]
    pub matcher_sets: Vec<MatcherSet>,
    #[serde(rename = "handle")]
    pub handlers: Vec<Handler>,
}

impl RouteRule {
    pub fn new(matcher_set: MatcherSet, handler: Handler) -> Self {
        Self {
            matcher_sets: vec![matcher_set],
            handlers: vec![handler],
        }
    }
}

/// Named predicates that must all hold. Serialized as an object keyed by matcher name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatcherSet(Vec<Matcher>);

impl MatcherSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, matcher: Matcher) -> Self {
        self.0.push(matcher);
        self
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MatcherSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for matcher in &self.0 {
            map.serialize_entry(matcher.name(), matcher)?;
        }
        map.end()
    }
}

/// A single request predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Matcher {
    /// First existing file among `try_files`
    File(FileMatcher),
    /// None of the nested sets match
    Not(Vec<MatcherSet>),
    /// Request path matches any glob
    Path(Vec<String>),
    /// Host header equals any of the names
    Host(Vec<String>),
}

impl Matcher {
    pub fn name(&self) -> &'static str {
        match self {
            Matcher::File(_) => "file",
            Matcher::Not(_) => "not",
            Matcher::Path(_) => "path",
            Matcher::Host(_) => "host",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatcher {
    pub try_files: Vec<String>,
    /// Extensions after which the rest of the path is path info
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub split_path: Vec<String>,
}

/// Terminal or transforming action of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "handler", rename_all = "snake_case")]
pub enum Handler {
    StaticResponse(StaticResponse),
    Rewrite(Rewrite),
    ReverseProxy(ReverseProxy),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticResponse {
    #[serde(serialize_with = "status_as_string")]
    pub status_code: StatusCode,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
}

fn status_as_string<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReverseProxy {
    pub transport: Transport,
    pub upstreams: Vec<Upstream>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "protocol")]
pub enum Transport {
    #[serde(rename = "fastcgi")]
    FastCgi(FastCgiTransport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastCgiTransport {
    /// Document root the FastCGI process resolves scripts against
    pub root: String,
    pub split_path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upstream {
    pub dial: String,
}

/// The three ordered stages of a PHP front end.
///
/// Each stage relies on the URI transformations of the previous one, so the order is
/// fixed by the type rather than by a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// Adds the trailing slash to directory paths that have an index script
    pub redirect: RouteRule,
    /// Rewrites to the script that should handle the request
    pub rewrite: RouteRule,
    /// Sends script requests to the FastCGI upstream
    pub dispatch: RouteRule,
}

impl Pipeline {
    /// Rules in evaluation order.
    pub fn rules(&self) -> [&RouteRule; 3] {
        [&self.redirect, &self.rewrite, &self.dispatch]
    }
}

impl Serialize for Pipeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rules())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn matcher_set_serializes_as_named_object() {
        let set = MatcherSet::new()
            .with(Matcher::Path(vec!["*.php".to_string()]))
            .with(Matcher::Not(vec![
                MatcherSet::new().with(Matcher::Path(vec!["*/".to_string()])),
            ]));

        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({"path": ["*.php"], "not": [{"path": ["*/"]}]})
        );
    }

    #[test]
    fn handlers_are_tagged_by_kind() {
        let redirect = Handler::StaticResponse(StaticResponse {
            status_code: StatusCode::PERMANENT_REDIRECT,
            headers: BTreeMap::from([("Location".to_string(), vec!["/x/".to_string()])]),
        });
        assert_eq!(
            serde_json::to_value(&redirect).unwrap(),
            json!({
                "handler": "static_response",
                "status_code": "308",
                "headers": {"Location": ["/x/"]}
            })
        );

        let proxy = Handler::ReverseProxy(ReverseProxy {
            transport: Transport::FastCgi(FastCgiTransport {
                root: "/srv".to_string(),
                split_path: vec![".php".to_string()],
            }),
            upstreams: vec![Upstream {
                dial: "localhost:9000".to_string(),
            }],
        });
        assert_eq!(
            serde_json::to_value(&proxy).unwrap(),
            json!({
                "handler": "reverse_proxy",
                "transport": {"protocol": "fastcgi", "root": "/srv", "split_path": [".php"]},
                "upstreams": [{"dial": "localhost:9000"}]
            })
        );
    }

    #[test]
    fn rule_without_matchers_omits_match_key() {
        let rule = RouteRule {
            matcher_sets: vec![],
            handlers: vec![Handler::Rewrite(Rewrite {
                uri: "/index.php".to_string(),
            })],
        };
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({"handle": [{"handler": "rewrite", "uri": "/index.php"}]})
        );
    }
}
