//! A recording [`HttpClient`] for unit tests.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Mutex;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode, header::CONTENT_TYPE};

use super::{HttpClient, HttpResponse};

/// Replays canned responses in order and keeps every request it was given.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<Request<Bytes>>>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON response.
    pub fn respond_json(self, status: u16, body: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        self.responses.lock().unwrap().push_back(MockResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: Bytes::copy_from_slice(body.as_bytes()),
        });
        self
    }

    /// Queues a response with an empty body.
    pub fn respond_empty(self, status: u16) -> Self {
        self.responses.lock().unwrap().push_back(MockResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        });
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Returns `(method, uri, headers, body)` of the n-th request.
    pub fn request(&self, n: usize) -> (Method, String, HeaderMap, String) {
        let requests = self.requests.lock().unwrap();
        let request = &requests[n];
        (
            request.method().clone(),
            request.uri().to_string(),
            request.headers().clone(),
            String::from_utf8(request.body().to_vec()).unwrap(),
        )
    }

    /// Decodes the urlencoded body of the n-th request into pairs.
    pub fn form(&self, n: usize) -> Vec<(String, String)> {
        let (_, _, _, body) = self.request(n);
        url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect()
    }
}

impl HttpClient for MockHttpClient {
    type Error = Infallible;
    type Response = MockResponse;

    async fn execute(&self, request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no mock response queued");
        Ok(response)
    }
}

impl HttpResponse for MockResponse {
    type Error = Infallible;

    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> HeaderMap {
        self.headers.clone()
    }

    async fn body(self) -> Result<Bytes, Self::Error> {
        Ok(self.body)
    }
}
