//! # Model Output Parsers
//!
//! Turns raw, untrusted model text into a [`CandidateResult`](crate::types::CandidateResult).
//! Neither parser assumes length or count constraints already hold.
//!
//! ## Parsers Available
//!
//! | Parser | Expects | Fails? |
//! |--------|---------|--------|
//! | [`parse_line_format`] | `Summary:` / `Cool fact:` lines | never |
//! | [`parse_schema_guided`] | a `{summary, cool_facts}` JSON object | [`ParseError`] |
//!
//! ## Shared Utilities
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`strip_think_tags`] | Remove `<think>` blocks before schema-guided decoding |
//! | [`try_repair_json`] | Fix near-miss JSON (trailing commas, smart quotes, truncation) |

pub mod error;
pub mod extract;
pub mod lines;
pub mod repair;
pub mod schema;

pub use error::ParseError;
pub use extract::{preprocess, strip_think_tags};
pub use lines::parse_line_format;
pub use repair::try_repair_json;
pub use schema::parse_schema_guided;
