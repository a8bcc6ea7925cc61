//! Context/span store and session identity

pub mod session;
mod store;

pub use store::{Attributes, ContextStore, FinishedSpan, SpanHandle, SpanRecord};
