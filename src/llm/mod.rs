pub mod completion_interface;
pub mod gemini_llm;

pub use completion_interface::*;
pub use gemini_llm::*;
