//! Shared application state.

use std::sync::Arc;

use notary_chain::{HttpPeerClient, Node};

/// The node behind every route, reaching peers over HTTP.
///
/// Passed to request handlers via Axum's `State` extractor.
pub type SharedState = Arc<Node<HttpPeerClient>>;
