//! Interactive question loop.

use anyhow::Context;
use clap::Args;
use docqa_core::config::AppConfig;
use docqa_knowledge::QaService;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::non_blank;

const PROMPT: &str = "Ask: ";

/// Interactive question loop
#[derive(Args, Debug)]
pub struct ChatCommand {}

fn is_exit(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig, base: &str) -> anyhow::Result<()> {
        let service = QaService::start(config, base)
            .await
            .context("service failed to start")?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(PROMPT.as_bytes()).await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            if is_exit(&line) {
                break;
            }

            let Some(question) = non_blank(&line) else {
                continue;
            };

            match service.answer_question(question).await {
                Ok(answer) => {
                    stdout.write_all(format!("{}\n\n", answer).as_bytes()).await?;
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        stdout.write_all(b"Goodbye!\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}
