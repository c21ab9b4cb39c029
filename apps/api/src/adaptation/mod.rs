// Content adaptation: rewords a candidate's experiences toward a target job.
// Implements: context building, task collection, per-field rewriting with
// validation, bounded fan-out/fan-in, and reconstruction.
// All LLM calls go through llm_client::TextGenerator.

pub mod adapter;
pub mod context;
pub mod fanout;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod reconstruct;
pub mod tasks;

#[cfg(test)]
pub mod testing;
