//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates a `stride_query::Record` implementation and field name
//! constants from `#[record(...)]` field annotations.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
