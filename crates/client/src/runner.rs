use std::io::{self, Write};
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::scenario::{Scenario, Step};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub url: String,
    /// Pause between consecutive steps.
    pub delay: Duration,
    /// Pause before the first step, giving a freshly started server time to bind.
    pub startup_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            delay: Duration::from_millis(500),
            startup_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Issues scenario steps one at a time and reports each outcome.
pub struct Runner {
    client: Client,
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { client, config })
    }

    /// Sends a single step. Any failure is confined to this request.
    pub async fn send(&self, step: &Step) -> Result<Reply, ClientError> {
        let mut request = self.client.request(step.method.clone(), &self.config.url);
        if let Some(payload) = &step.payload {
            request = request.json(payload);
        }

        debug!(method = %step.method, url = %self.config.url, "sending request");

        let response = request.send().await.map_err(|err| self.classify(err))?;
        let status = response.status();
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                ClientError::Timeout(self.config.timeout)
            } else {
                ClientError::Body(err)
            }
        })?;

        Ok(Reply { status, body })
    }

    /// Runs every step in order, writing the operator report to `out`.
    /// Request failures are reported and the script moves on.
    pub async fn run<W: Write>(&self, scenario: &Scenario, out: &mut W) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();

        if !self.config.startup_delay.is_zero() {
            sleep(self.config.startup_delay).await;
        }

        for (index, step) in scenario.steps().iter().enumerate() {
            if index > 0 {
                writeln!(out)?;
            }
            writeln!(out, "{}. {}", index + 1, step.title)?;

            match self.send(step).await {
                Ok(reply) => {
                    summary.completed += 1;
                    write_reply(out, &step.method, &reply)?;
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!("step {} failed: {err}", index + 1);
                    write_failure(out, &err)?;
                }
            }
            out.flush()?;

            if index + 1 < scenario.len() && !self.config.delay.is_zero() {
                sleep(self.config.delay).await;
            }
        }

        Ok(summary)
    }

    fn classify(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.timeout)
        } else {
            ClientError::Transport(err)
        }
    }
}

fn write_failure<W: Write>(out: &mut W, err: &ClientError) -> io::Result<()> {
    match err {
        ClientError::Body(_) => writeln!(out, "Помилка читання відповіді: {err}"),
        _ => writeln!(out, "Помилка виконання запиту: {err}"),
    }
}

fn write_reply<W: Write>(out: &mut W, method: &Method, reply: &Reply) -> io::Result<()> {
    writeln!(out, "Статус: {}", reply.status)?;
    if *method == Method::GET {
        writeln!(out, "Відповідь:\n{}", reply.body)
    } else {
        writeln!(out, "Відповідь: {}", reply.body)
    }
}
