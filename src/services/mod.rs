pub mod prompt_builder;
pub mod result_writer;
pub mod vlm_service;

pub use prompt_builder::PromptBuilder;
pub use result_writer::ResultWriter;
pub use vlm_service::VlmService;
