pub mod address;
pub mod assembler;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod synthesis;

pub use address::{Address, AddressResolver, Role, Scheme};
pub use assembler::{PipelineAssembler, ServerSpec, TopLevelConfig};
pub use error::SynthesisError;
pub use pipeline::Pipeline;
pub use routes::RouteSynthesizer;
pub use synthesis::{DEFAULT_FROM, Synthesis, synthesize_all};
