//! `OmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::OmdbError;
use super::types::RawResponse;

/// OMDb request funnel.
///
/// Every operation against OMDb goes through `make_request`, so lookups and
/// searches can run against a mock backend in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(OmdbApi: Send)]
pub trait LocalOmdbApi {
    /// Sends one GET request with the given query parameters.
    ///
    /// Implementations add the API key under the reserved `apikey` parameter,
    /// replacing any caller-supplied value.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the status is not a
    /// success, or the body is not a JSON object.
    async fn make_request(&self, params: &[(&str, String)]) -> Result<RawResponse, OmdbError>;
}
