//! # lexi-llm
//!
//! The content generator seam and its production implementation:
//!
//! - [`generator`]: the [`ContentGenerator`] trait, [`StageRequest`], and
//!   the `RagContext` the engine assembles per call
//! - [`http`]: OpenAI-compatible chat-completions client with fenced-JSON
//!   extraction and per-stage temperatures
//! - [`retry`]: exponential backoff owned by the generator
//! - [`cache`]: bounded TTL wrapper keyed on the full request
//! - [`image`]: optional image analysis feeding vocabulary generation
//!
//! ## Crate Position
//!
//! Depends on `lexi-core`, `lexi-catalog` (selection types in requests),
//! and `lexi-settings`. Consumed by `lexi-engine`.

#![deny(unsafe_code)]

pub mod cache;
pub mod errors;
pub mod generator;
pub mod http;
pub mod image;
pub mod retry;

pub use cache::CachedGenerator;
pub use errors::{GeneratorError, Result};
pub use generator::{
    ContentGenerator, HierarchyMeta, RagContext, SelectedStrategy, StageRequest, UnitMeta,
};
pub use http::HttpGenerator;
pub use image::{ImageAnalyzer, ImageSource, NoopAnalyzer};
pub use retry::RetryConfig;
