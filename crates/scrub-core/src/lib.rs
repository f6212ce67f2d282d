//! Core domain models for scrub
//!
//! This crate contains:
//! - Discussion models (Post, Answer, Followup, Reply)
//! - Name spans produced by detection
//! - The error taxonomy shared by every crate

pub mod discussion;
pub mod error;
pub mod span;

pub use discussion::{Answer, AuthorType, DiscussionNode, Followup, Post, Reply};
pub use error::{Error, Result};
pub use span::{NameSpan, SpanSource};

/// Placeholder substituted for every confirmed name
pub const DEFAULT_PLACEHOLDER: &str = "[NAME]";
