//! Single-movie lookup.

use tracing::instrument;

use super::api::LocalOmdbApi;
use super::error::OmdbError;
use super::types::OmdbMovie;

/// Fetches one movie by IMDb ID.
///
/// The identifier is passed to OMDb as-is. An unknown ID is not turned into
/// an error here; the returned projection simply lacks the requested fields.
///
/// # Errors
///
/// Returns an error if the underlying request fails.
#[instrument(skip_all)]
pub async fn get_by_imdb_id(
    api: &impl LocalOmdbApi,
    imdb_id: &str,
) -> Result<OmdbMovie, OmdbError> {
    tracing::info!(imdb_id, "Fetching detail for IMDb ID");
    let raw = api.make_request(&[("i", String::from(imdb_id))]).await?;
    Ok(OmdbMovie::new(raw))
}
