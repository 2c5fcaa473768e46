//! Audio transcription endpoint.

use reqwest::multipart::{Form, Part};

use crate::error::{OpenAIError, Result};
use crate::types::Transcription;
use crate::OpenAIClient;

impl OpenAIClient {
    /// Transcribe an audio (or video container) file.
    ///
    /// `filename` matters: the API infers the container format from its
    /// extension.
    pub async fn transcribe(
        &self,
        model: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<Transcription> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| OpenAIError::Config(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("model", model.to_string());

        let response = self
            .http_client()
            .post(format!("{}/audio/transcriptions", self.base_url()))
            .bearer_auth(self.api_key())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAIError::Api(format!("HTTP {status}: {body}")));
        }

        response
            .json::<Transcription>()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }
}
