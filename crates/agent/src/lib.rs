//! Recommendation agent for the equipment chat assistant.
//!
//! A request flows through four stages:
//! 1. **Intent detection** (`intent`) - ordered keyword rules, follow-up
//!    handling against conversation history, and an optional LLM classifier
//!    (`classifier`, `llm`) as the last resort.
//! 2. **Generation** (`recommend`) - picks catalog items for the intent,
//!    skipping anything already recommended when the user is following up.
//! 3. **Formatting** (`response`) - renders the markdown-ish chat reply.
//! 4. **Orchestration** (`runtime`) - `RecommendationEngine` ties the stages
//!    together and logs each one.
//!
//! The LLM only ever labels a request. Item choice, quantities and rates come
//! from the catalog and the rules in this crate.

pub mod classifier;
pub mod conversation;
pub mod extract;
pub mod intent;
pub mod llm;
pub mod recommend;
pub mod response;
pub mod runtime;

pub use runtime::{
    parse_history, RecommendationEngine, RecommendationRequest, RecommendationResponse,
};
