//! Filtering the catalog.
//!
//! [`engine::query`] evaluates a [`FilterSpec`] synchronously; [`QueryWorker`]
//! runs the same evaluation on the blocking pool for callers that issue a new
//! filter on every keystroke.

pub mod engine;
pub mod filter;
pub mod predicate;
pub mod suggest;
pub mod worker;

pub use engine::{query, query_cancellable};
pub use filter::{FilterSpec, ParseFilterError, Tag, TagCategory, TagLogic};
pub use predicate::{Predicate, matches};
pub use suggest::{DEFAULT_SUGGESTION_LIMIT, Suggestion, suggest};
pub use worker::{QueryRequest, QueryResult, QueryWorker};
