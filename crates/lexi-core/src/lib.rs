//! # lexi-core
//!
//! Foundation types for the Lexi course-generation engine.
//!
//! This crate provides the shared vocabulary that all other Lexi crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::CourseId`], [`ids::BookId`], [`ids::UnitId`]
//!   as newtypes
//! - **Levels**: [`level::CefrLevel`] proficiency bands, ordered A1–C2
//! - **Hierarchy**: [`unit::Course`], [`unit::Book`], [`unit::Unit`] with
//!   the unit status and stage enums
//! - **Content payloads**: [`content::VocabularySection`],
//!   [`content::TipsContent`], [`content::AssessmentSection`], etc.
//! - **Logging**: [`logging::init_logging`] tracing bootstrap
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other lexi crates.

#![deny(unsafe_code)]

pub mod content;
pub mod ids;
pub mod level;
pub mod logging;
pub mod unit;
