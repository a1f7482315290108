//! Stateless repository structs — each method takes `&Connection` and
//! executes SQL. Transaction boundaries belong to the store facade.

pub mod book;
pub mod course;
pub mod unit;
