//! Scripted transport for engine tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::NetworkError;
use crate::http_client::{FetchedResource, Transport};

/// Answers from canned responses; unknown URLs fail like a refused connection.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    gets: HashMap<String, Canned>,
    heads: HashMap<String, Canned>,
    head_calls: Mutex<Vec<String>>,
    get_calls: Mutex<Vec<String>>,
}

#[derive(Clone)]
struct Canned {
    final_url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Canned {
    fn respond(&self) -> FetchedResource {
        FetchedResource::from_parts(
            self.final_url.clone(),
            self.status,
            self.headers.clone(),
            self.body.clone(),
        )
    }
}

fn resource(final_url: &str, status: StatusCode, content_type: Option<&str>, body: &str) -> Canned {
    let mut headers = HeaderMap::new();
    if let Some(ct) = content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(ct).unwrap());
    }
    Canned {
        final_url: final_url.to_string(),
        status,
        headers,
        body: body.to_string(),
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, content_type: Option<&str>, body: &str) -> Self {
        self.redirected_page(url, url, content_type, body)
    }

    pub fn redirected_page(mut self, url: &str, final_url: &str, content_type: Option<&str>, body: &str) -> Self {
        self.gets
            .insert(url.to_string(), resource(final_url, StatusCode::OK, content_type, body));
        self
    }

    pub fn page_with_status(mut self, url: &str, status: StatusCode, content_type: &str, body: &str) -> Self {
        self.gets
            .insert(url.to_string(), resource(url, status, Some(content_type), body));
        self
    }

    pub fn head(mut self, url: &str, content_type: Option<&str>) -> Self {
        self.heads
            .insert(url.to_string(), resource(url, StatusCode::OK, content_type, ""));
        self
    }

    pub fn head_with_status(mut self, url: &str, status: StatusCode, content_type: &str) -> Self {
        self.heads
            .insert(url.to_string(), resource(url, status, Some(content_type), ""));
        self
    }

    pub fn head_calls(&self) -> Vec<String> {
        self.head_calls.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.get_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<FetchedResource, NetworkError> {
        self.get_calls.lock().unwrap().push(url.to_string());
        self.gets
            .get(url)
            .map(Canned::respond)
            .ok_or_else(|| NetworkError::new(url, "connection refused"))
    }

    async fn head(&self, url: &str) -> Result<FetchedResource, NetworkError> {
        self.head_calls.lock().unwrap().push(url.to_string());
        self.heads
            .get(url)
            .map(Canned::respond)
            .ok_or_else(|| NetworkError::new(url, "connection refused"))
    }
}
