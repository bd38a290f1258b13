use thiserror::Error;

use crate::{
    config::validation::ValidationError,
    core::address::{AddressError, Role},
};

/// Flag naming the upstream address input.
pub const TO_FLAG: &str = "--to";
/// Flag naming the document root input.
pub const ROOT_FLAG: &str = "--root";

/// Everything that can stop a configuration from being synthesized.
///
/// All variants are terminal: no partial configuration is produced.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum SynthesisError {
    #[error("{flag} is required")]
    MissingRequiredInput { flag: &'static str },

    #[error("invalid {role} address {address}: {source}")]
    InvalidAddress {
        role: Role,
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("paths are not allowed: {address}")]
    PathNotAllowed { address: String },

    #[error("invalid upstream scheme {scheme}: should be omitted or 'unix'")]
    InvalidUpstreamScheme { scheme: String },

    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] ValidationError),
}
