// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use palette_app::{AnswerSource, LookupStrategy};
use std::collections::VecDeque;
use std::io::Read;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Response, Server};

const SAMPLE_TASKS: [&str; 4] = [
    "Quantas tarefas existem no total?",
    "Lista-me tudo.",
    "Quantas tarefas pertencem à loja 40 ?",
    "Quantas tarefas pertencem à loja 50 e à categoria zaffari?",
];

pub fn sample_tasks() -> Vec<String> {
    SAMPLE_TASKS.iter().map(|task| (*task).to_owned()).collect()
}

pub fn chat_reply_body(question: &str, answer: &str) -> String {
    serde_json::json!([
        { "role": "user", "content": question },
        { "role": "assistant", "content": answer },
    ])
    .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
}

impl MockReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn answer(question: &str, answer: &str) -> Self {
        Self::ok(chat_reply_body(question, answer))
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

pub struct MockChatServer {
    base_url: String,
    handle: JoinHandle<Result<Vec<RecordedRequest>>>,
}

impl MockChatServer {
    pub fn start(replies: Vec<MockReply>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut recorded = Vec::with_capacity(replies.len());
            for reply in replies {
                let mut request = server.recv().context("receive mock request")?;
                let mut body = String::new();
                request
                    .as_reader()
                    .read_to_string(&mut body)
                    .context("read mock request body")?;
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    body,
                });

                let header = Header::from_bytes("Content-Type", "application/json")
                    .map_err(|_| anyhow!("build content type header"))?;
                let response = Response::from_string(reply.body)
                    .with_status_code(reply.status)
                    .with_header(header);
                request.respond(response).context("send mock response")?;
            }
            Ok(recorded)
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?
    }
}

#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, answer: impl Into<String>) -> Self {
        self.push(Ok(answer.into()));
        self
    }

    pub fn with_error(self, error: impl Into<String>) -> Self {
        self.push(Err(error.into()));
        self
    }

    fn push(&self, outcome: std::result::Result<String, String>) {
        match self.script.lock() {
            Ok(mut script) => script.push_back(outcome),
            Err(poisoned) => poisoned.into_inner().push_back(outcome),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        match self.questions.lock() {
            Ok(questions) => questions.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AnswerSource for ScriptedSource {
    fn strategy(&self) -> LookupStrategy {
        LookupStrategy::Remote
    }

    fn answer(&self, question: &str) -> Result<String> {
        match self.questions.lock() {
            Ok(mut questions) => questions.push(question.to_owned()),
            Err(poisoned) => poisoned.into_inner().push(question.to_owned()),
        }
        let next = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        match next {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(error)) => Err(anyhow!(error)),
            None => Ok(question.to_owned()),
        }
    }
}
