//! Wraps a synthesized [`Pipeline`] into a loadable top-level configuration.
//!
//! The pipeline sits in a `subroute` behind a host gate, on a single server that listens
//! on the downstream port. The administrative endpoint of the runtime is disabled.
use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::core::{
    address::Address,
    pipeline::{Matcher, MatcherSet, Pipeline},
};

/// Host predicate in front of the pipeline.
///
/// Built for every server, including a hostless one, whose gate names the empty host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGate {
    host: String,
}

impl HostGate {
    pub fn for_host(host: &str) -> Self {
        Self {
            host: host.to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn matcher_sets(&self) -> Vec<MatcherSet> {
        vec![MatcherSet::new().with(Matcher::Host(vec![self.host.clone()]))]
    }
}

/// A listening server running one host-gated pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub listen: Vec<String>,
    pub host_gate: HostGate,
    pub pipeline: Pipeline,
}

#[derive(Serialize)]
struct ServerJson<'a> {
    listen: &'a [String],
    routes: [GatedRouteJson<'a>; 1],
}

#[derive(Serialize)]
struct GatedRouteJson<'a> {
    #[serde(rename = "match")]
    matcher_sets: Vec<MatcherSet>,
    handle: [SubrouteJson<'a>; 1],
}

#[derive(Serialize)]
struct SubrouteJson<'a> {
    handler: &'static str,
    routes: &'a Pipeline,
}

impl Serialize for ServerSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ServerJson {
            listen: &self.listen,
            routes: [GatedRouteJson {
                matcher_sets: self.host_gate.matcher_sets(),
                handle: [SubrouteJson {
                    handler: "subroute",
                    routes: &self.pipeline,
                }],
            }],
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminConfig {
    pub disabled: bool,
}

/// The artifact handed to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelConfig {
    pub admin: AdminConfig,
    pub servers: BTreeMap<String, ServerSpec>,
}

impl TopLevelConfig {
    pub fn admin_enabled(&self) -> bool {
        !self.admin.disabled
    }
}

#[derive(Serialize)]
struct TopLevelJson<'a> {
    admin: AdminConfig,
    apps: AppsJson<'a>,
}

#[derive(Serialize)]
struct AppsJson<'a> {
    http: HttpAppJson<'a>,
}

#[derive(Serialize)]
struct HttpAppJson<'a> {
    servers: &'a BTreeMap<String, ServerSpec>,
}

impl Serialize for TopLevelConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TopLevelJson {
            admin: self.admin,
            apps: AppsJson {
                http: HttpAppJson {
                    servers: &self.servers,
                },
            },
        }
        .serialize(serializer)
    }
}

/// Places a pipeline on a named server.
#[derive(Debug, Clone)]
pub struct PipelineAssembler {
    server_name: String,
}

impl PipelineAssembler {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
        }
    }

    pub fn assemble(&self, downstream: &Address, pipeline: Pipeline) -> TopLevelConfig {
        let server = ServerSpec {
            listen: vec![downstream.listen_address()],
            host_gate: HostGate::for_host(&downstream.host),
            pipeline,
        };

        TopLevelConfig {
            admin: AdminConfig { disabled: true },
            servers: BTreeMap::from([(self.server_name.clone(), server)]),
        }
    }
}
