pub mod registry_loader;

pub use registry_loader::{load_object_registry, load_prompt_registry};
