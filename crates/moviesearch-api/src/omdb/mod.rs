//! OMDb API client module.
//!
//! Sends requests to the OMDb endpoint and exposes movie data through
//! read-only projections over the decoded responses.

mod api;
mod client;
mod error;
mod lookup;
mod search;
mod types;

#[cfg(test)]
mod fake;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalOmdbApi, OmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{OmdbClient, OmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::OmdbError;
pub use lookup::get_by_imdb_id;
pub use search::{MovieSearch, search_movies};
#[allow(clippy::module_name_repetitions)]
pub use types::{OmdbMovie, RawResponse};
