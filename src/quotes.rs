use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::from_str;
use std::time::Duration;

static FALLBACK_DIR: Dir = include_dir!("src/fallback");

/// One attempt per trial start, bounded by this timeout. No retries.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const QUOTE_API_URL: &str = "https://api.quotable.io/random";

/// Supplies target sentences. Implementations run on a worker thread, so
/// they may block for up to the fetch timeout.
pub trait QuoteSource: Send + 'static {
    /// A target sentence, or None when the source has nothing usable;
    /// the caller falls back to the local pool.
    fn fetch_quote(&self) -> Option<String>;
}

#[derive(Deserialize)]
struct QuoteResponse {
    content: String,
}

/// Remote quote service. Any transport error, non-success status, or empty
/// body collapses to None.
pub struct HttpQuoteSource {
    client: reqwest::blocking::Client,
}

impl HttpQuoteSource {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpQuoteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSource for HttpQuoteSource {
    fn fetch_quote(&self) -> Option<String> {
        let response = self.client.get(QUOTE_API_URL).send().ok()?;
        if !response.status().is_success() {
            return None;
        }
        let quote: QuoteResponse = response.json().ok()?;
        let content = quote.content.trim().to_string();
        if content.is_empty() {
            None
        } else {
            Some(content)
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
struct SentencePool {
    #[allow(dead_code)]
    name: String,
    #[allow(dead_code)]
    size: u32,
    sentences: Vec<String>,
}

fn read_sentence_pool() -> SentencePool {
    let file = FALLBACK_DIR
        .get_file("sentences.json")
        .expect("fallback sentence file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    from_str(file_as_str).expect("Unable to deserialize fallback sentence json")
}

/// Local sentences drawn in shuffled order; the queue is refilled and
/// reshuffled once every sentence has been handed out.
#[derive(Debug)]
pub struct FallbackPool {
    sentences: Vec<String>,
    queue: Vec<String>,
}

impl FallbackPool {
    pub fn new() -> Self {
        Self::with_sentences(read_sentence_pool().sentences)
    }

    pub fn with_sentences(sentences: Vec<String>) -> Self {
        let mut queue = sentences.clone();
        queue.shuffle(&mut rand::thread_rng());
        Self { sentences, queue }
    }

    pub fn next(&mut self) -> String {
        if self.queue.is_empty() {
            self.queue = self.sentences.clone();
            self.queue.shuffle(&mut rand::thread_rng());
        }
        self.queue.pop().expect("sentence pool is empty")
    }
}

impl Default for FallbackPool {
    fn default() -> Self {
        Self::new()
    }
}
