//! Tutor: chat-completion client, prompts, and the parsers that turn model
//! replies into typed study material.
//!
//! Components:
//! - `client`: one bearer-authenticated chat-completion call per request
//! - `prompts`: message lists for each action
//! - `normalize`: untrusted plan JSON to a complete `StudyPlan`
//! - `parse`: exercise and sentence extraction from noisy replies

pub mod client;
pub mod normalize;
pub mod parse;
pub mod prompts;
