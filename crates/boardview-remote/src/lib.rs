//! Boardview remote
//!
//! The boundary to the conversational-AI platform: a [`RemoteClient`] trait
//! bound to one API key, a [`RemoteConnector`] that hands out clients per
//! key, and the reqwest-backed implementation. With the `test-utils`
//! feature an in-memory platform is available for tests.

pub mod client;
pub mod error;
pub mod http;
mod http_client;
#[cfg(feature = "test-utils")]
pub mod mock;

pub use client::{MODEL_PAGE_SIZE, ModelPage, PageRequest, RemoteClient, RemoteConnector};
pub use error::{RemoteError, Result};
pub use http::{API_KEY_HEADER, DEFAULT_BASE_URL, HttpConnector, HttpRemoteClient};
#[cfg(feature = "test-utils")]
pub use mock::{InMemoryClient, InMemoryPlatform};
