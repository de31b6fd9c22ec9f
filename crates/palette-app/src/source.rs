// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

pub trait AnswerSource: Send + Sync {
    fn strategy(&self) -> LookupStrategy;
    fn answer(&self, question: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    Canned,
    Remote,
}

impl LookupStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Canned => "canned",
            Self::Remote => "remote",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "canned" => Some(Self::Canned),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }
}
