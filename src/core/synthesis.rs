//! Entry point tying resolution, synthesis and assembly together.
use crate::{
    config::{models::Settings, validation::SettingsValidator},
    core::{
        address::{Address, AddressResolver, Role},
        assembler::{PipelineAssembler, TopLevelConfig},
        error::{ROOT_FLAG, SynthesisError, TO_FLAG},
        routes::RouteSynthesizer,
    },
};

/// Listener address used when `--from` is not given.
pub const DEFAULT_FROM: &str = "localhost";

/// Result of a successful synthesis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub downstream: Address,
    pub upstream: Address,
    pub config: TopLevelConfig,
}

/// Build the full configuration for serving PHP from `root` via the FastCGI process at
/// `to`, listening on `from` (or [`DEFAULT_FROM`]).
///
/// Pure: no I/O, no shared state, identical inputs give identical output.
pub fn synthesize_all(
    from: Option<&str>,
    to: &str,
    root: &str,
    settings: &Settings,
) -> Result<Synthesis, SynthesisError> {
    if to.is_empty() {
        return Err(SynthesisError::MissingRequiredInput { flag: TO_FLAG });
    }
    if root.is_empty() {
        return Err(SynthesisError::MissingRequiredInput { flag: ROOT_FLAG });
    }

    SettingsValidator::validate(settings)?;

    let from = from.unwrap_or(DEFAULT_FROM);

    let resolver = AddressResolver::new(settings.defaults);
    let downstream = resolver.resolve(from, Role::Downstream)?;
    let upstream = resolver.resolve(to, Role::Upstream)?;

    let pipeline = RouteSynthesizer::new(&settings.policy).synthesize(&upstream, root);
    let config = PipelineAssembler::new(settings.server.name.as_str()).assemble(&downstream, pipeline);

    tracing::debug!(
        downstream = %downstream,
        upstream = %upstream,
        root,
        "Synthesized PHP FastCGI config"
    );

    Ok(Synthesis {
        downstream,
        upstream,
        config,
    })
}
