// CV analysis: prompt building, AI reply decoding, scoring, and the analyze route.
// All LLM calls go through llm_client.

pub mod ai_response;
pub mod handlers;
pub mod prompts;
pub mod scoring;
pub mod service;
