//! Fenced code block scanning for language-model replies.
//!
//! Models asked for JSON often wrap it in a ```` ```json ```` fence, sometimes
//! with prose around it. The scanner finds fenced blocks with a real CommonMark
//! parser so nested or unterminated fences behave predictably.

pub mod code_block;

pub use code_block::{CodeBlockAnalyzer, FencedBlock, extract_json_payload};
