// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use palette_app::{AnswerSource, LookupStrategy};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

// The backend echoes the question first, then the reply.
const REPLY_INDEX: usize = 1;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("backend.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "backend.base_url {base_url:?} must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn post_chat(&self, question: &str) -> Result<Value> {
        let url = format!("{}/chat", self.base_url);
        debug!(url = %url, "posting chat question");
        let response = self
            .http
            .post(&url)
            .json(&ChatRequest { question })
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().context("decode chat response")
    }

    pub fn ask(&self, question: &str) -> Result<String> {
        let body = self.post_chat(question)?;
        extract_reply(&body)
    }
}

impl AnswerSource for Client {
    fn strategy(&self) -> LookupStrategy {
        LookupStrategy::Remote
    }

    fn answer(&self, question: &str) -> Result<String> {
        self.ask(question)
    }
}

pub fn extract_reply(body: &Value) -> Result<String> {
    let entries = body.as_array().ok_or_else(|| {
        anyhow!("unexpected chat response: expected a JSON array, got {}", kind_of(body))
    })?;
    let entry = entries.get(REPLY_INDEX).ok_or_else(|| {
        anyhow!(
            "unexpected chat response: expected at least {} entries, got {}",
            REPLY_INDEX + 1,
            entries.len()
        )
    })?;
    let reply: ReplyEntry = serde_json::from_value(entry.clone()).map_err(|_| {
        anyhow!("unexpected chat response: entry {REPLY_INDEX} has no string `content` field")
    })?;
    Ok(reply.content)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("chat backend at {base_url} timed out ({error})");
    }
    anyhow!("cannot reach chat backend at {base_url} -- is it running? ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(detail) = parsed.detail
            && !detail.is_empty()
        {
            return anyhow!("server error ({}): {}", status.as_u16(), detail);
        }
        if let Some(error) = parsed.error
            && !error.is_empty()
        {
            return anyhow!("server error ({}): {}", status.as_u16(), error);
        }
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyEntry {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: Option<String>,
    error: Option<String>,
}
