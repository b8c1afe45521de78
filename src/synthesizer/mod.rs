//! Relationship Synthesizer: prompt assembly and the single completion call.

pub mod client;

use std::sync::Arc;

use futures::future::join_all;

use crate::config::ProviderConfig;
use crate::error::{Result, WeaverError};
use crate::store::NoteStore;

pub use client::{Completion, CompletionClient, TokenUsage};

/// Instruction prepended to the combined note contents.
pub const PROMPT_LEAD_IN: &str =
    "Below are the contents of several notes from one collection. \
     Describe how these notes relate to each other:\n\n";

/// Returned when no API key is configured. No network call is made.
pub const MISSING_CREDENTIAL: &str =
    "No API key configured. Set the NOTE_WEAVER_API_KEY environment variable and try again.";

/// Returned for any transport or provider failure. Detail goes to the log.
pub const PROVIDER_FAILURE: &str =
    "Could not get a response from the completion provider. Check the logs for details.";

/// Returned when the provider answers without usable content.
pub const EMPTY_RESPONSE: &str = "The completion provider returned no response content.";

/// Re-reads a batch of notes, assembles one prompt, and asks the provider
/// how the notes relate.
///
/// The public contract is fail-soft: `synthesize` always returns a string,
/// either the model's answer or one of the fixed sentinels above. The typed
/// failure is available through `try_synthesize`.
pub struct Synthesizer {
    store: Arc<dyn NoteStore>,
    client: CompletionClient,
}

impl Synthesizer {
    pub fn new(store: Arc<dyn NoteStore>, config: ProviderConfig) -> Result<Self> {
        let client = CompletionClient::new(config)?;
        Ok(Self { store, client })
    }

    /// Swap in a freshly loaded provider configuration.
    pub fn reload(&mut self, config: ProviderConfig) -> Result<()> {
        self.client = CompletionClient::new(config)?;
        Ok(())
    }

    /// Answer string or sentinel; never an error.
    pub async fn synthesize(&self, paths: &[String]) -> String {
        match self.try_synthesize(paths).await {
            Ok(answer) => answer,
            Err(WeaverError::Config(msg)) => {
                tracing::warn!("synthesis aborted: {}", msg);
                MISSING_CREDENTIAL.to_string()
            }
            Err(WeaverError::EmptyResponse) => {
                tracing::warn!("provider response had no content");
                EMPTY_RESPONSE.to_string()
            }
            Err(e) => {
                tracing::error!("completion call failed: {}", e);
                PROVIDER_FAILURE.to_string()
            }
        }
    }

    /// Same pipeline with the failure kind exposed.
    pub async fn try_synthesize(&self, paths: &[String]) -> Result<String> {
        if !self.client.has_api_key() {
            return Err(WeaverError::Config("no API key configured".to_string()));
        }

        let contents = self.read_batch(paths).await;
        let prompt = assemble_prompt(&contents);

        let completion = self.client.complete(&prompt).await?;
        if let Some(usage) = &completion.usage {
            tracing::debug!(
                "completion used {} prompt + {} completion tokens",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(completion.content)
    }

    /// Read every path concurrently; results land in slots indexed by input
    /// position, so the output order is the input order regardless of which
    /// read finishes first. A path that fails to resolve or read yields an
    /// empty slot.
    async fn read_batch(&self, paths: &[String]) -> Vec<String> {
        join_all(paths.iter().map(|path| self.read_slot(path))).await
    }

    async fn read_slot(&self, path: &str) -> String {
        let Some(resolved) = self.store.resolve(path).await else {
            tracing::warn!("note no longer resolves, using empty content: {}", path);
            return String::new();
        };
        match self.store.read_content(&resolved).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("failed to re-read note {}, using empty content: {}", path, e);
                String::new()
            }
        }
    }
}

fn assemble_prompt(contents: &[String]) -> String {
    format!("{}{}", PROMPT_LEAD_IN, contents.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// In-memory store with per-path read delays and missing paths.
    struct MockStore {
        notes: Vec<(String, String)>,
        delays_ms: Vec<(String, u64)>,
    }

    impl MockStore {
        fn new(notes: &[(&str, &str)]) -> Self {
            Self {
                notes: notes
                    .iter()
                    .map(|(p, c)| (p.to_string(), c.to_string()))
                    .collect(),
                delays_ms: Vec::new(),
            }
        }

        fn with_delay(mut self, path: &str, millis: u64) -> Self {
            self.delays_ms.push((path.to_string(), millis));
            self
        }
    }

    #[async_trait]
    impl NoteStore for MockStore {
        async fn list_notes(&self) -> Result<Vec<String>> {
            Ok(self.notes.iter().map(|(p, _)| p.clone()).collect())
        }

        async fn read_content(&self, path: &str) -> Result<String> {
            if let Some((_, millis)) = self.delays_ms.iter().find(|(p, _)| p == path) {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            self.notes
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, c)| c.clone())
                .ok_or_else(|| WeaverError::NoteNotFound(path.to_string()))
        }

        async fn resolve(&self, path: &str) -> Option<String> {
            self.notes
                .iter()
                .find(|(p, _)| p == path)
                .map(|(p, _)| p.clone())
        }
    }

    /// Mock completion endpoint recording connection count and request bodies.
    struct MockProvider {
        endpoint: String,
        hits: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockProvider {
        /// Prompt extracted from the first recorded request.
        fn recorded_prompt(&self) -> String {
            let requests = self.requests.lock().unwrap();
            let raw = requests.first().expect("no request recorded");
            let body = raw.split("\r\n\r\n").nth(1).expect("no request body");
            let value: serde_json::Value = serde_json::from_str(body).expect("body not json");
            value["messages"][0]["content"]
                .as_str()
                .expect("no message content")
                .to_string()
        }
    }

    /// Read one HTTP request, waiting until the content-length body arrived.
    async fn read_http_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let n = match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            data.extend_from_slice(&buf[..n]);
            if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&data[..pos]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= pos + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    async fn spawn_provider(status_line: &str, body: String) -> MockProvider {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let status_line = status_line.to_string();
        let hits_task = hits.clone();
        let requests_task = requests.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };
                hits_task.fetch_add(1, Ordering::SeqCst);

                let raw = read_http_request(&mut socket).await;
                requests_task.lock().unwrap().push(raw);

                let response = format!(
                    "{}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        MockProvider {
            endpoint: format!("http://{}/v1", addr),
            hits,
            requests,
        }
    }

    fn answer_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"content": content}}]
        })
        .to_string()
    }

    fn config_with_key(endpoint: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: Some("test-token".to_string()),
            organization: None,
            project: None,
            model: "gpt-test".to_string(),
            endpoint: endpoint.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn synthesizer(store: MockStore, config: ProviderConfig) -> Synthesizer {
        Synthesizer::new(Arc::new(store), config).unwrap()
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_synthesize_returns_answer() {
        let provider = spawn_provider("HTTP/1.1 200 OK", answer_body("A relates to B via X")).await;
        let store = MockStore::new(&[("proj/note1.md", "content one")]);
        let synth = synthesizer(store, config_with_key(&provider.endpoint));

        let answer = synth.synthesize(&paths(&["proj/note1.md"])).await;

        assert_eq!(answer, "A relates to B via X");
        assert_eq!(provider.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prompt_contains_lead_in_and_contents_in_order() {
        let provider = spawn_provider("HTTP/1.1 200 OK", answer_body("ok")).await;
        let store = MockStore::new(&[("a.md", "x"), ("b.md", "y"), ("c.md", "z")]);
        let synth = synthesizer(store, config_with_key(&provider.endpoint));

        synth.synthesize(&paths(&["a.md", "b.md", "c.md"])).await;

        let prompt = provider.recorded_prompt();
        assert!(prompt.starts_with(PROMPT_LEAD_IN));
        assert!(prompt.ends_with("x\ny\nz"));
    }

    #[tokio::test]
    async fn test_order_preserved_with_inverted_read_latencies() {
        let provider = spawn_provider("HTTP/1.1 200 OK", answer_body("ok")).await;
        let store = MockStore::new(&[("a.md", "x"), ("b.md", "y"), ("c.md", "z")])
            .with_delay("a.md", 80)
            .with_delay("b.md", 30);
        let synth = synthesizer(store, config_with_key(&provider.endpoint));

        synth.synthesize(&paths(&["a.md", "b.md", "c.md"])).await;

        let prompt = provider.recorded_prompt();
        assert!(prompt.ends_with("x\ny\nz"));
    }

    #[tokio::test]
    async fn test_missing_credential_sentinel_without_provider_call() {
        let provider = spawn_provider("HTTP/1.1 200 OK", answer_body("never seen")).await;
        let store = MockStore::new(&[("a.md", "x")]);
        let mut config = config_with_key(&provider.endpoint);
        config.api_key = None;
        let synth = synthesizer(store, config);

        let answer = synth.synthesize(&paths(&["a.md"])).await;

        assert_eq!(answer, MISSING_CREDENTIAL);
        assert_eq!(provider.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_kind_is_config() {
        let store = MockStore::new(&[]);
        let mut config = config_with_key("http://127.0.0.1:1/v1");
        config.api_key = None;
        let synth = synthesizer(store, config);

        let err = synth.try_synthesize(&paths(&["a.md"])).await.unwrap_err();

        assert!(matches!(err, WeaverError::Config(_)));
    }

    #[tokio::test]
    async fn test_unresolved_path_becomes_empty_slot() {
        let provider = spawn_provider("HTTP/1.1 200 OK", answer_body("ok")).await;
        let store = MockStore::new(&[("a.md", "x"), ("c.md", "z")]);
        let synth = synthesizer(store, config_with_key(&provider.endpoint));

        let answer = synth.synthesize(&paths(&["a.md", "gone.md", "c.md"])).await;

        assert_eq!(answer, "ok");
        let prompt = provider.recorded_prompt();
        assert!(prompt.ends_with("x\n\nz"));
    }

    #[tokio::test]
    async fn test_provider_http_error_maps_to_generic_sentinel() {
        let provider = spawn_provider(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"error":"boom"}"#.to_string(),
        )
        .await;
        let store = MockStore::new(&[("a.md", "x")]);
        let synth = synthesizer(store, config_with_key(&provider.endpoint));

        let answer = synth.synthesize(&paths(&["a.md"])).await;

        assert_eq!(answer, PROVIDER_FAILURE);
    }

    #[tokio::test]
    async fn test_unreachable_provider_maps_to_generic_sentinel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = MockStore::new(&[("a.md", "x")]);
        let synth = synthesizer(store, config_with_key(&format!("http://{}/v1", addr)));

        let answer = synth.synthesize(&paths(&["a.md"])).await;

        assert_eq!(answer, PROVIDER_FAILURE);
    }

    #[tokio::test]
    async fn test_empty_choices_maps_to_empty_response_sentinel() {
        let provider =
            spawn_provider("HTTP/1.1 200 OK", r#"{"choices":[]}"#.to_string()).await;
        let store = MockStore::new(&[("a.md", "x")]);
        let synth = synthesizer(store, config_with_key(&provider.endpoint));

        let answer = synth.synthesize(&paths(&["a.md"])).await;

        assert_eq!(answer, EMPTY_RESPONSE);
    }

    #[tokio::test]
    async fn test_null_content_maps_to_empty_response_sentinel() {
        let body = serde_json::json!({
            "choices": [{"message": {"content": null}}]
        })
        .to_string();
        let provider = spawn_provider("HTTP/1.1 200 OK", body).await;
        let store = MockStore::new(&[("a.md", "x")]);
        let synth = synthesizer(store, config_with_key(&provider.endpoint));

        let answer = synth.synthesize(&paths(&["a.md"])).await;

        assert_eq!(answer, EMPTY_RESPONSE);
    }

    #[tokio::test]
    async fn test_empty_input_still_attempts_the_call() {
        let provider = spawn_provider("HTTP/1.1 200 OK", answer_body("nothing to relate")).await;
        let store = MockStore::new(&[]);
        let synth = synthesizer(store, config_with_key(&provider.endpoint));

        let answer = synth.synthesize(&[]).await;

        assert_eq!(answer, "nothing to relate");
        assert_eq!(provider.hits.load(Ordering::SeqCst), 1);
        assert_eq!(provider.recorded_prompt(), PROMPT_LEAD_IN);
    }

    #[tokio::test]
    async fn test_reload_replaces_configuration() {
        let provider = spawn_provider("HTTP/1.1 200 OK", answer_body("after reload")).await;
        let store = MockStore::new(&[("a.md", "x")]);
        let mut config = config_with_key(&provider.endpoint);
        config.api_key = None;
        let mut synth = synthesizer(store, config);

        assert_eq!(synth.synthesize(&paths(&["a.md"])).await, MISSING_CREDENTIAL);

        synth.reload(config_with_key(&provider.endpoint)).unwrap();
        assert_eq!(synth.synthesize(&paths(&["a.md"])).await, "after reload");
    }

    #[test]
    fn test_assemble_prompt_joins_with_newlines() {
        let contents = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let prompt = assemble_prompt(&contents);

        assert_eq!(prompt, format!("{}x\ny\nz", PROMPT_LEAD_IN));
    }

    #[test]
    fn test_assemble_prompt_empty_batch() {
        let prompt = assemble_prompt(&[]);

        assert_eq!(prompt, PROMPT_LEAD_IN);
    }
}
