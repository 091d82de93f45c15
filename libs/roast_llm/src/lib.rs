use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;

pub mod openai;

#[derive(Debug, Clone)]
pub enum LLMProvider {
    OpenAI { api_key: String, model: String },
}

/// A single chat completion: one system message, one user message and the
/// sampling settings to run them with.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait LLMService {
    /// Returns the trimmed text of the first choice, empty if the model
    /// produced nothing.
    async fn execute_prompt(&self, request: &CompletionRequest) -> Result<String>;
}

pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    // base_delay * 2, * 4, * 8 ... capped at 30s
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        let base_ms = self.base_delay.as_millis().max(1) as u64;
        ExponentialBackoff::from_millis(2)
            .factor(base_ms)
            .max_delay(Duration::from_secs(30))
            .take(self.max_retries as usize)
    }
}

pub struct LLMClientConfig {
    pub timeout: Duration,
    pub retry_config: RetryConfig,
}

impl Default for LLMClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            retry_config: RetryConfig::default(),
        }
    }
}

impl LLMClientConfig {
    /// Longest a single `execute_prompt` can take: every attempt timing out
    /// plus every backoff delay between them.
    pub fn worst_case_duration(&self) -> Duration {
        let attempts = self.retry_config.max_retries.saturating_add(1);
        let backoff: Duration = self.retry_config.strategy().sum();
        self.timeout.saturating_mul(attempts) + backoff
    }
}

pub struct LLMClient {
    service: Box<dyn LLMService + Send + Sync>,
    config: LLMClientConfig,
}

impl LLMClient {
    pub fn new(provider: LLMProvider, config: Option<LLMClientConfig>) -> Self {
        let service: Box<dyn LLMService + Send + Sync> = match provider {
            LLMProvider::OpenAI { api_key, model } => {
                Box::new(openai::OpenAIService::new(api_key, model))
            }
        };

        Self::from_service(service, config)
    }

    pub fn from_service(
        service: Box<dyn LLMService + Send + Sync>,
        config: Option<LLMClientConfig>,
    ) -> Self {
        Self {
            service,
            config: config.unwrap_or_default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.config.retry_config = retry_config;
        self
    }
}

#[async_trait]
impl LLMService for LLMClient {
    async fn execute_prompt(&self, request: &CompletionRequest) -> Result<String> {
        let max_attempts = self.config.retry_config.max_retries + 1;
        let call_timeout = self.config.timeout;
        let service = &self.service;
        let mut attempt = 0;

        Retry::spawn(self.config.retry_config.strategy(), || {
            attempt += 1;
            let current = attempt;
            let call = timeout(call_timeout, service.execute_prompt(request));

            async move {
                match call.await {
                    Ok(Ok(text)) => Ok(text),
                    Ok(Err(e)) => {
                        tracing::warn!(
                            "Chat completion failed (attempt {}/{}): {}",
                            current,
                            max_attempts,
                            e
                        );
                        Err(e)
                    }
                    Err(_) => {
                        tracing::warn!(
                            "Chat completion timed out after {:?} (attempt {}/{})",
                            call_timeout,
                            current,
                            max_attempts
                        );
                        Err(anyhow!("Chat completion timed out after {:?}", call_timeout))
                    }
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyService {
        calls: Arc<AtomicU32>,
        failures: u32,
    }

    #[async_trait]
    impl LLMService for FlakyService {
        async fn execute_prompt(&self, request: &CompletionRequest) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(anyhow!("upstream unavailable"))
            } else {
                Ok(format!("echo: {}", request.prompt))
            }
        }
    }

    struct SlowService;

    #[async_trait]
    impl LLMService for SlowService {
        async fn execute_prompt(&self, _request: &CompletionRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("too late".to_string())
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "system".to_string(),
            prompt: "hello".to_string(),
            max_tokens: 10,
            temperature: 0.5,
        }
    }

    fn flaky_client(failures: u32, max_retries: u32) -> (LLMClient, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let service = FlakyService {
            calls: calls.clone(),
            failures,
        };
        let client = LLMClient::from_service(Box::new(service), None).with_retry_config(
            RetryConfig {
                max_retries,
                base_delay: Duration::from_millis(1),
            },
        );
        (client, calls)
    }

    #[tokio::test]
    async fn default_policy_makes_a_single_attempt() {
        let (client, calls) = flaky_client(1, 0);

        assert!(client.execute_prompt(&request()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let (client, calls) = flaky_client(2, 3);

        let text = client.execute_prompt(&request()).await.unwrap();
        assert_eq!(text, "echo: hello");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let (client, calls) = flaky_client(10, 2);

        assert!(client.execute_prompt(&request()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let client = LLMClient::from_service(Box::new(SlowService), None)
            .with_timeout(Duration::from_millis(10));

        let err = client.execute_prompt(&request()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn worst_case_covers_every_attempt_and_backoff() {
        let single = LLMClientConfig {
            timeout: Duration::from_secs(20),
            retry_config: RetryConfig::default(),
        };
        assert_eq!(single.worst_case_duration(), Duration::from_secs(20));

        let retrying = LLMClientConfig {
            timeout: Duration::from_secs(10),
            retry_config: RetryConfig {
                max_retries: 2,
                base_delay: Duration::from_secs(1),
            },
        };
        // 3 attempts of 10s, then backoff of 2s and 4s
        assert_eq!(retrying.worst_case_duration(), Duration::from_secs(36));
    }
}
