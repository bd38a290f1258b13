//! Route synthesis for a PHP front controller.
//!
//! The pipeline runs in three stages:
//! 1. directories with an index script but no trailing slash get a permanent redirect,
//!    so relative links inside the page resolve correctly
//! 2. the URI is rewritten to the first existing file among the path, the path's index
//!    script, and the root index script (path info after `.php` is split off first)
//! 3. requests that now end in a script extension are dispatched over FastCGI
//!
//! Anything else (static assets, missing files) falls through untouched.
use std::collections::BTreeMap;

use http::StatusCode;

use crate::{
    config::models::ExtensionPolicy,
    core::{
        address::Address,
        pipeline::{
            FastCgiTransport, FileMatcher, Handler, MATCHED_FILE_RELATIVE, Matcher, MatcherSet,
            Pipeline, REQUEST_PATH, ReverseProxy, Rewrite, RouteRule, StaticResponse, Transport,
            Upstream,
        },
    },
};

/// Header name as the runtime expects it in a `static_response`.
pub const LOCATION_HEADER: &str = "Location";

/// Builds the ordered redirect / rewrite / dispatch pipeline from an [`ExtensionPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct RouteSynthesizer<'a> {
    policy: &'a ExtensionPolicy,
}

impl<'a> RouteSynthesizer<'a> {
    pub fn new(policy: &'a ExtensionPolicy) -> Self {
        Self { policy }
    }

    /// Pure and total: the same inputs always produce an equal pipeline.
    pub fn synthesize(&self, upstream: &Address, root: &str) -> Pipeline {
        Pipeline {
            redirect: self.redirect_rule(),
            rewrite: self.rewrite_rule(),
            dispatch: self.dispatch_rule(upstream, root),
        }
    }

    fn index_under_request_path(&self) -> String {
        format!("{REQUEST_PATH}/{}", self.policy.index_file)
    }

    fn redirect_rule(&self) -> RouteRule {
        let matchers = MatcherSet::new()
            .with(Matcher::File(FileMatcher {
                try_files: vec![self.index_under_request_path()],
                split_path: Vec::new(),
            }))
            .with(Matcher::Not(vec![
                MatcherSet::new().with(Matcher::Path(vec!["*/".to_string()])),
            ]));

        let handler = Handler::StaticResponse(StaticResponse {
            status_code: StatusCode::PERMANENT_REDIRECT,
            headers: BTreeMap::from([(
                LOCATION_HEADER.to_string(),
                vec![format!("{REQUEST_PATH}/")],
            )]),
        });

        RouteRule::new(matchers, handler)
    }

    fn rewrite_rule(&self) -> RouteRule {
        let try_files = vec![
            REQUEST_PATH.to_string(),
            self.index_under_request_path(),
            self.policy.index_file.clone(),
        ];

        RouteRule::new(
            MatcherSet::new().with(Matcher::File(FileMatcher {
                try_files,
                split_path: self.policy.extensions.clone(),
            })),
            Handler::Rewrite(Rewrite {
                uri: MATCHED_FILE_RELATIVE.to_string(),
            }),
        )
    }

    fn dispatch_rule(&self, upstream: &Address, root: &str) -> RouteRule {
        RouteRule::new(
            MatcherSet::new().with(Matcher::Path(self.policy.path_globs())),
            Handler::ReverseProxy(ReverseProxy {
                transport: Transport::FastCgi(FastCgiTransport {
                    root: root.to_string(),
                    split_path: self.policy.extensions.clone(),
                }),
                upstreams: vec![Upstream {
                    dial: upstream.dial_address(),
                }],
            }),
        )
    }
}
