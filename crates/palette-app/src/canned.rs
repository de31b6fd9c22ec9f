// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AnswerSource, LookupStrategy};
use anyhow::Result;
use std::collections::BTreeMap;

pub const TOTAL_COUNT_QUESTION: &str = "Quantas tarefas existem no total?";
pub const LIST_ALL_QUESTION: &str = "Lista-me tudo.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CannedAnswers {
    entries: BTreeMap<String, String>,
}

impl CannedAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_tasks<S: AsRef<str>>(tasks: &[S]) -> Self {
        let mut answers = Self::new();
        answers.insert(TOTAL_COUNT_QUESTION, format!("{} tarefas", tasks.len()));
        let listing = tasks
            .iter()
            .enumerate()
            .map(|(index, task)| format!("{}. {}", index + 1, task.as_ref().trim()))
            .collect::<Vec<_>>()
            .join("\n");
        answers.insert(LIST_ALL_QUESTION, listing);
        answers
    }

    pub fn insert(&mut self, question: &str, answer: impl Into<String>) {
        self.entries.insert(question.to_owned(), answer.into());
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.entries.get(question).map(String::as_str)
    }

    pub fn resolve(&self, question: &str) -> String {
        self.get(question)
            .map(str::to_owned)
            .unwrap_or_else(|| question.to_owned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AnswerSource for CannedAnswers {
    fn strategy(&self) -> LookupStrategy {
        LookupStrategy::Canned
    }

    fn answer(&self, question: &str) -> Result<String> {
        Ok(self.resolve(question))
    }
}
