// Draft generation: prompt construction and the completion gateway.
// All model calls go through llm_client::Completion.

pub mod gateway;
pub mod prompts;
