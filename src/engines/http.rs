/*!
 * HTTP synthesis engine client.
 *
 * Talks to a network TTS server: multipart POST carrying the text, model
 * name, optional length penalty, and the voice reference file; the response
 * body is a WAV payload. Server errors and network failures are retried with
 * exponential backoff, client errors are not.
 */

use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::multipart;
use reqwest::Client;

use crate::app_config::EngineConfig;
use crate::audio::wav;
use crate::engines::{SynthesisOutput, SynthesisRequest, TtsEngine};
use crate::errors::EngineError;

/// Client for a network synthesis server
#[derive(Debug)]
pub struct HttpTtsEngine {
    /// Base URL of the synthesis server
    base_url: String,
    /// Model name sent with every request
    model: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl HttpTtsEngine {
    /// Create a new client from the engine configuration. Fails when the
    /// HTTP client itself cannot be constructed; a default client would
    /// lack the configured request timeout.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            // Synthesis servers speak HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| EngineError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
        })
    }

    async fn build_form(&self, request: &SynthesisRequest) -> Result<multipart::Form, EngineError> {
        let voice_bytes = tokio::fs::read(&request.voice_reference)
            .await
            .map_err(|e| {
                EngineError::RequestFailed(format!(
                    "Failed to read voice reference {}: {}",
                    request.voice_reference.display(),
                    e
                ))
            })?;

        let voice_part = multipart::Part::bytes(voice_bytes)
            .file_name(
                request
                    .voice_reference
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "voice.wav".to_string()),
            )
            .mime_str("audio/wav")
            .map_err(|e| EngineError::RequestFailed(format!("Invalid voice part: {}", e)))?;

        let mut form = multipart::Form::new()
            .text("text", request.text.clone())
            .text("model", self.model.clone())
            .part("voice_reference", voice_part);

        if let Some(penalty) = request.length_penalty {
            form = form.text("length_penalty", penalty.to_string());
        }

        Ok(form)
    }

    /// Send one synthesis request with the retry loop
    async fn post_synthesis(&self, request: &SynthesisRequest) -> Result<Vec<u8>, EngineError> {
        let url = format!("{}/tts", self.base_url);

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            // Multipart forms are consumed on send, rebuild per attempt
            let form = self.build_form(request).await?;

            let response_result = self.client.post(&url).multipart(form).send().await;

            match response_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.bytes().await.map(|b| b.to_vec()).map_err(|e| {
                            EngineError::RequestFailed(format!(
                                "Failed to read synthesis response body: {}",
                                e
                            ))
                        });
                    } else if status.is_server_error() {
                        // Server error - can retry
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!(
                            "Synthesis server error ({}): {} - attempt {}/{}",
                            status,
                            error_text,
                            attempt + 1,
                            self.max_retries + 1
                        );
                        last_error = Some(EngineError::RequestFailed(format!(
                            "Synthesis server error ({}): {}",
                            status, error_text
                        )));
                    } else {
                        // Client error - don't retry
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!("Synthesis request rejected ({}): {}", status, error_text);
                        return Err(EngineError::RequestFailed(format!(
                            "Synthesis request rejected ({}): {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    // Network error (including timeout) - can retry
                    error!(
                        "Synthesis network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(EngineError::RequestFailed(format!(
                        "Failed to reach synthesis server: {}",
                        e
                    )));
                }
            }

            attempt += 1;

            // If we have more retries left, wait with exponential backoff
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            EngineError::RequestFailed(format!(
                "Synthesis request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }
}

#[async_trait]
impl TtsEngine for HttpTtsEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput, EngineError> {
        let body = self.post_synthesis(request).await?;
        let (samples, sample_rate) = wav::decode_wav_bytes(&body)?;

        if samples.is_empty() {
            return Err(EngineError::EmptyAudio(request.text.clone()));
        }

        Ok(SynthesisOutput {
            samples,
            sample_rate,
        })
    }

    async fn check_ready(&self) -> Result<(), EngineError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::RequestFailed(format!("Health check failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EngineError::RequestFailed(format!(
                "Synthesis server is not ready ({})",
                response.status()
            )))
        }
    }
}
