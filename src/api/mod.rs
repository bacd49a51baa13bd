//! Forum API module
//!
//! This module contains everything that talks to the remote forum:
//! - Opaque request credentials
//! - JSON wire types and their conversion into storage records
//! - The HTTP client for listings and thread detail pages

mod client;
mod credentials;
mod types;

pub use client::{build_http_client, DetailFetch, ForumClient};
pub use credentials::Credentials;
pub use types::{
    Listing, ListingEntry, PostFields, PostPage, RemotePost, RemoteThread, DEFAULT_AUTHOR,
    DEFAULT_SUBJECT,
};
