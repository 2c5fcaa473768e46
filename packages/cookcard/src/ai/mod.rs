//! Model provider implementations.

mod openai;

pub use openai::OpenAiRecipeModel;
