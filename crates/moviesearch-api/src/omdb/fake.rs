//! Scripted in-process `LocalOmdbApi` for tests.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{Value, json};

use super::api::LocalOmdbApi;
use super::error::OmdbError;
use super::types::RawResponse;

/// Replays queued responses and records every request's parameters.
#[derive(Debug, Default)]
pub struct FakeOmdb {
    responses: Mutex<VecDeque<Result<RawResponse, OmdbError>>>,
    calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl FakeOmdb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, value: Value) -> Self {
        let raw = serde_json::from_value(value).unwrap();
        self.responses.lock().unwrap().push_back(Ok(raw));
        self
    }

    pub fn fail(self, err: OmdbError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<Vec<(String, String)>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl LocalOmdbApi for FakeOmdb {
    async fn make_request(&self, params: &[(&str, String)]) -> Result<RawResponse, OmdbError> {
        self.calls.lock().unwrap().push(
            params
                .iter()
                .map(|(k, v)| (String::from(*k), v.clone()))
                .collect(),
        );
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OmdbError::Builder(String::from("no scripted response"))))
    }
}

/// Builds a search envelope holding `count` summary items numbered from `first`.
pub fn search_page(first: u32, count: u32, total: &str) -> Value {
    let items: Vec<Value> = (first..first.saturating_add(count))
        .map(|n| {
            json!({
                "Title": format!("Movie {n}"),
                "Year": "2001",
                "imdbID": format!("tt{n:07}"),
                "Type": "movie"
            })
        })
        .collect();
    json!({ "Search": items, "totalResults": total, "Response": "True" })
}
