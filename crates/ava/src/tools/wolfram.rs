use async_trait::async_trait;

use super::{ApiClient, Tool, ToolOutput};
use crate::config::ServiceConfig;
use crate::error::ApiError;

const SERVICE: &str = "maths";

/// Wolfram Alpha short answers: one line of plain text per question.
pub struct MathsTool {
    client: ApiClient,
    config: ServiceConfig,
}

impl MathsTool {
    pub fn new(client: ApiClient, config: ServiceConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Tool for MathsTool {
    fn name(&self) -> &'static str {
        "maths"
    }

    fn description(&self) -> &'static str {
        "Use this when you need to answer questions about maths, science, unit conversions or calculations. The input should be the question in natural language."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        let app_id = self.config.key.require(SERVICE)?;
        tracing::info!(query = %query, "Asking Wolfram Alpha");

        let request = self
            .client
            .http()
            .get(format!("{}/v1/result", self.config.base_url))
            .query(&[("i", query), ("appid", app_id.as_str())]);
        let answer = self.client.get_text(SERVICE, request).await?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(ApiError::Empty { service: SERVICE });
        }
        Ok(ToolOutput::markdown(answer).with_clipboard(answer))
    }
}
