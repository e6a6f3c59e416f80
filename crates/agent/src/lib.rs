//! Agent runtime: turns a chat message into a reply.
//!
//! A message flows through a constrained loop:
//! 1. **Routing** (`router`) - the generator labels the message; keywords decide when it can't.
//! 2. **Extraction** (`extraction`, `guardrails`) - dish, location and travel filters are
//!    read from generator JSON, with text heuristics behind every field.
//! 3. **Lookup** (`pipeline`, `weather`, `nutrition`) - provider calls through `chowbot-gateway`.
//! 4. **Synthesis** - one generator call writes the answer; `style` applies the guild tone.
//!
//! The generator only phrases answers. Which places qualify, how filters
//! default and which pool a spin draws from are decided in code.

pub mod chat;
pub mod clock;
pub mod extraction;
pub mod guardrails;
pub mod llm;
pub mod nutrition;
pub mod pipeline;
pub mod router;
pub mod runtime;
pub mod spin;
pub mod style;
pub mod weather;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, FixedClock, TaipeiClock};
pub use extraction::{ExtractedPlace, Extractor, GenerativeExtractor};
pub use guardrails::ExtractionError;
pub use llm::{GeneratorError, HttpLlmClient, LlmClient, UnconfiguredLlm};
pub use pipeline::{FoodAnswer, FoodOutcome, FoodQueryPipeline, PipelineSettings};
pub use router::IntentRouter;
pub use runtime::{AgentReply, AgentRuntime, AgentServices};
pub use spin::{run_spin, DisplayError, SpinDisplay, SpinError, SpinSelector};
pub use style::StyleRewriter;
