pub mod loaders;
pub mod registry;

pub use loaders::{load_object_registry, load_prompt_registry};
pub use registry::{ObjectRegistry, PromptEntry, PromptRegistry};
