//! Client-side collaborators of the launchpad backend: the typed API, its
//! HTTP transport, the token metadata cache and the per-login session that
//! owns the issue watcher.

pub mod api;
pub mod cache;
pub mod client;
pub mod errors;
pub mod manager;
pub mod model;
pub mod service;

pub use api::LaunchpadApi;
pub use cache::TokenInfoCache;
pub use client::HttpLaunchpadClient;
pub use errors::ClientError;
pub use manager::{LaunchSession, SessionConfig};
pub use model::*;
pub use service::{LaunchpadService, MetadataSequence};
