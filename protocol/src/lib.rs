//! Wire-level types shared between the session core and its frontends.
//!
//! These mirror the subset of the OpenAI Responses API item shapes that a
//! game-playing session actually exchanges: chat messages, reasoning
//! summaries, function calls and their outputs, plus token-usage counters.

pub mod models;

pub use models::ContentItem;
pub use models::ReasoningItemReasoningSummary;
pub use models::ResponseItem;
pub use models::TokenUsage;
