//! sqlspy
//!
//! Logs every prepared-statement execution with its literal SQL:
//!
//! - **Rewriting**: redirect the driver's `prepareStatement` through a proxy class
//! - **Proxy**: record bound values and log the reconstructed statement on execution
//! - **Agent**: attach-time configuration and registration with the host's loader
//!
//! See [`agent`] for bootstrap and [`sqlspy_core`] for the engine.

pub mod agent;
pub mod logging;

pub use agent::{config_from_args, Agent, ModuleLoadPipeline, TransformerChain};
pub use logging::init_tracing;

pub use sqlspy_classfile;
pub use sqlspy_core;
pub use sqlspy_types;
