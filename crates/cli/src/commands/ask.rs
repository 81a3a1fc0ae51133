//! Ask command handler.

use anyhow::Context;
use clap::Args;
use docqa_core::config::AppConfig;
use docqa_knowledge::QaService;

use super::{non_blank, EMPTY_QUESTION_REPLY};

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig, base: &str) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");

        let Some(question) = non_blank(&self.question) else {
            anyhow::bail!(EMPTY_QUESTION_REPLY);
        };

        let service = QaService::start(config, base)
            .await
            .context("service failed to start")?;

        let answer = service.answer(question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("{}", answer.text);
        }

        Ok(())
    }
}
