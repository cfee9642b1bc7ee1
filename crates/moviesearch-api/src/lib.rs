//! API client library for moviesearch.
//!
//! Provides a client for the OMDb movie-information API.

/// OMDb API client.
pub mod omdb;
