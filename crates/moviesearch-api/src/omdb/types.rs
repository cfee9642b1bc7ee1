//! OMDb response map and the typed movie projection over it.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::OmdbError;

// --- Raw response ---

/// A decoded OMDb response body, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawResponse(Map<String, Value>);

impl RawResponse {
    /// Wraps an already-decoded JSON object.
    #[must_use]
    pub const fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Consumes the response, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Reads a string value, failing with `MissingField` when absent.
    pub(crate) fn require_str(&self, key: &'static str) -> Result<&str, OmdbError> {
        let value = self.get(key).ok_or(OmdbError::MissingField { key })?;
        value
            .as_str()
            .ok_or_else(|| OmdbError::malformed(key, "a string", value))
    }
}

impl From<Map<String, Value>> for RawResponse {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// --- Movie projection ---

/// Read-only typed view over one movie object returned by OMDb.
///
/// Search results carry only `imdbID`, `Title` and `Year`; the detail-only
/// accessors (`runtime_minutes`, `genres`, `plot`) fail with
/// [`OmdbError::MissingDetailField`] on them. Every accessor re-reads the
/// wrapped map.
#[derive(Debug, Clone, PartialEq)]
pub struct OmdbMovie {
    /// Raw JSON object from OMDb.
    data: RawResponse,
}

impl OmdbMovie {
    /// Wraps a raw response.
    #[must_use]
    pub const fn new(data: RawResponse) -> Self {
        Self { data }
    }

    /// Borrows the wrapped response.
    #[must_use]
    pub const fn raw(&self) -> &RawResponse {
        &self.data
    }

    /// Consumes the projection, returning the wrapped response.
    #[must_use]
    pub fn into_raw(self) -> RawResponse {
        self.data
    }

    fn check_for_detail_data_key(&self, key: &'static str) -> Result<(), OmdbError> {
        if self.data.contains_key(key) {
            Ok(())
        } else {
            Err(OmdbError::MissingDetailField { key })
        }
    }

    fn detail_str(&self, key: &'static str) -> Result<&str, OmdbError> {
        self.check_for_detail_data_key(key)?;
        self.data.require_str(key)
    }

    /// IMDb identifier (e.g. `tt0133093`).
    ///
    /// # Errors
    ///
    /// `MissingField` if `imdbID` is absent, `MalformedField` if it is not a string.
    pub fn imdb_id(&self) -> Result<&str, OmdbError> {
        self.data.require_str("imdbID")
    }

    /// Movie title.
    ///
    /// # Errors
    ///
    /// `MissingField` if `Title` is absent, `MalformedField` if it is not a string.
    pub fn title(&self) -> Result<&str, OmdbError> {
        self.data.require_str("Title")
    }

    /// Release year.
    ///
    /// # Errors
    ///
    /// `MissingField` if `Year` is absent, `MalformedField` if it is not an integer string.
    pub fn year(&self) -> Result<i32, OmdbError> {
        let raw = self.data.require_str("Year")?;
        raw.parse()
            .map_err(|_| OmdbError::malformed("Year", "an integer", raw))
    }

    /// Runtime in minutes, parsed from `"<N> min"`.
    ///
    /// # Errors
    ///
    /// `MissingDetailField` on summary responses, `MalformedField` if the
    /// value is not exactly a number and the unit `min`.
    pub fn runtime_minutes(&self) -> Result<i32, OmdbError> {
        let raw = self.detail_str("Runtime")?;

        let mut tokens = raw.split(' ');
        let (Some(minutes), Some(units), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(OmdbError::malformed("Runtime", "'<N> min'", raw));
        };

        if units != "min" {
            return Err(OmdbError::malformed("Runtime", "units 'min'", units));
        }

        minutes
            .parse()
            .map_err(|_| OmdbError::malformed("Runtime", "an integer number of minutes", minutes))
    }

    /// Genres, split from the comma-separated `Genre` field.
    ///
    /// # Errors
    ///
    /// `MissingDetailField` on summary responses.
    pub fn genres(&self) -> Result<Vec<&str>, OmdbError> {
        Ok(self.detail_str("Genre")?.split(", ").collect())
    }

    /// Plot summary.
    ///
    /// # Errors
    ///
    /// `MissingDetailField` on summary responses.
    pub fn plot(&self) -> Result<&str, OmdbError> {
        self.detail_str("Plot")
    }

    /// Error message OMDb put in the body, if any (e.g. `"Movie not found!"`).
    #[must_use]
    pub fn api_error(&self) -> Option<&str> {
        self.data.get("Error").and_then(Value::as_str)
    }
}
