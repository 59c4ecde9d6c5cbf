//! Models carrying thumbnail fields and their save pipeline.

pub mod registry;
pub mod saver;

pub use registry::{ModelRegistry, RegisteredModel};
pub use saver::ModelSaver;
