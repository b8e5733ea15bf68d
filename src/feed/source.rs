use crate::error::{FeedError, FeedResult};
use crate::record::JobRecord;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

/// One page of the remote feed as seen by the paginator.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// The page carried a `results` sequence, possibly empty
    Records(Vec<JobRecord>),
    /// The body had some other shape, treated as end of data
    Malformed,
}

impl Page {
    /// Interpret a decoded response body.
    ///
    /// Only `{ "results": [...] }` yields records. Elements of `results` that
    /// are not objects are skipped, objects with mistyped fields are kept with
    /// those fields empty.
    pub fn from_body(body: Value) -> Self {
        let Value::Object(mut fields) = body else {
            return Page::Malformed;
        };
        let Some(Value::Array(results)) = fields.remove("results") else {
            return Page::Malformed;
        };

        let records = results
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!("Jobmark: Skipping undecodable feed entry {}: {}", index, err);
                    None
                }
            })
            .collect();
        Page::Records(records)
    }
}

/// Something that can fetch a single page of the job feed by its 1-based index.
pub trait PageSource: Send + Sync + 'static {
    fn fetch_page(&self, page: u32) -> BoxFuture<'_, FeedResult<Page>>;
}

/// Fetches pages with `GET <base_url>?page=<n>`.
#[derive(Clone)]
pub struct HttpPageSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, page: u32) -> BoxFuture<'_, FeedResult<Page>> {
        async move {
            debug!("Jobmark: Fetching page {} from {}", page, self.base_url);
            let response = self
                .client
                .get(&self.base_url)
                .query(&[("page", page)])
                .send()
                .await
                .map_err(|err| FeedError::Request(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                // the body decides, a non-success body without results ends the feed
                warn!("Jobmark: Feed page {} answered with status {}", page, status);
            }

            let body = response
                .json::<Value>()
                .await
                .map_err(|err| FeedError::Decode(err.to_string()))?;
            Ok(Page::from_body(body))
        }
        .boxed()
    }
}
