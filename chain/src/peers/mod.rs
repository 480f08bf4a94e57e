//! Peer membership: the registry of known endpoints and the client seam
//! used to reach them.

pub mod client;
pub mod discovery;
pub mod http;
pub mod registry;

pub use client::{PeerClient, PeerError};
pub use discovery::{discover, probe_liveness};
pub use http::HttpPeerClient;
pub use registry::{PeerRegistry, normalize_endpoint};
