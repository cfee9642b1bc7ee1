//! Paginated movie search.

use std::collections::VecDeque;

use futures::Stream;
use serde_json::Value;
use tracing::instrument;

use super::api::LocalOmdbApi;
use super::error::OmdbError;
use super::types::{OmdbMovie, RawResponse};

/// Lazy, finite sequence of search results spanning every result page.
///
/// One request is made per page, and only once the previous page has been
/// consumed. After an error or the last result the sequence stays finished.
#[derive(Debug)]
pub struct MovieSearch<'a, A> {
    api: &'a A,
    /// Search text.
    text: String,
    /// Next page to request (1-based).
    page: u32,
    /// Items yielded so far.
    seen: u64,
    /// `totalResults` from the first page.
    total: Option<u64>,
    /// Items of the current page not yet yielded.
    pending: VecDeque<RawResponse>,
    finished: bool,
}

/// Starts a movie search. No request is made until the first item is pulled.
#[must_use]
pub fn search_movies<'a, A: LocalOmdbApi>(api: &'a A, text: &str) -> MovieSearch<'a, A> {
    tracing::info!(search = text, "Performing a search");
    MovieSearch {
        api,
        text: String::from(text),
        page: 1,
        seen: 0,
        total: None,
        pending: VecDeque::new(),
        finished: false,
    }
}

impl<A: LocalOmdbApi> MovieSearch<'_, A> {
    /// Returns the next movie, fetching the next page when the current one is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if a page request fails or its envelope is malformed.
    /// No further items are produced afterwards.
    pub async fn next_movie(&mut self) -> Result<Option<OmdbMovie>, OmdbError> {
        loop {
            if let Some(raw) = self.pending.pop_front() {
                self.seen = self.seen.saturating_add(1);
                return Ok(Some(OmdbMovie::new(raw)));
            }

            if self.finished {
                return Ok(None);
            }

            if let Some(total) = self.total
                && self.seen >= total
            {
                self.finished = true;
                return Ok(None);
            }

            match self.fetch_page().await {
                Ok(items) => {
                    if items.is_empty() {
                        self.finished = true;
                    }
                    self.pending.extend(items);
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }
    }

    /// Total result count reported by the first page, once it has been fetched.
    #[must_use]
    pub const fn total_results(&self) -> Option<u64> {
        self.total
    }

    /// Converts the search into a `Stream` with the same paging behavior.
    pub fn into_stream(self) -> impl Stream<Item = Result<OmdbMovie, OmdbError>> {
        futures::stream::try_unfold(self, |mut search| async move {
            let next = search.next_movie().await?;
            Ok::<_, OmdbError>(next.map(|movie| (movie, search)))
        })
    }

    #[instrument(skip_all)]
    async fn fetch_page(&mut self) -> Result<Vec<RawResponse>, OmdbError> {
        tracing::info!(page = self.page, "Fetching page");

        let params = [
            ("s", self.text.clone()),
            ("type", String::from("movie")),
            ("page", self.page.to_string()),
        ];
        let body = self.api.make_request(&params).await?;

        let total = if let Some(total) = self.total {
            total
        } else {
            let total = parse_total_results(&body)?;
            self.total = Some(total);
            total
        };

        let items = if total == 0 && !body.contains_key("Search") {
            Vec::new()
        } else {
            parse_search_items(body)?
        };

        tracing::debug!(page = self.page, fetched = items.len(), total, "Page received");
        self.page = self.page.saturating_add(1);
        Ok(items)
    }
}

/// Reads the string-encoded `totalResults` of a search envelope.
fn parse_total_results(body: &RawResponse) -> Result<u64, OmdbError> {
    let raw = body.require_str("totalResults")?;
    raw.parse()
        .map_err(|_| OmdbError::malformed("totalResults", "an integer", raw))
}

/// Splits the `Search` array of an envelope into per-movie responses.
fn parse_search_items(body: RawResponse) -> Result<Vec<RawResponse>, OmdbError> {
    let mut map = body.into_inner();
    let items = match map.remove("Search") {
        Some(Value::Array(items)) => items,
        Some(other) => return Err(OmdbError::malformed("Search", "an array", other)),
        None => return Err(OmdbError::MissingField { key: "Search" }),
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(obj) => Ok(RawResponse::new(obj)),
            other => Err(OmdbError::malformed("Search", "an array of objects", other)),
        })
        .collect()
}
