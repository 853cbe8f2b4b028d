//! Upstream drama sources.
//!
//! Each provider knows its endpoints and how to normalize its JSON into the
//! unified [`crate::model`] types. Every list call degrades to an empty
//! list when the upstream fails, so callers never see transport errors.

pub mod provider;
pub mod providers;

pub use provider::{is_dubbed_title, ContextHints, DramaSource, DUBBED_MARKER, LIST_LIMIT};
pub use providers::{DramaBoxProvider, MeloloProvider, NetShortProvider};
