// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result};
use palette_app::{AnswerSource, CannedAnswers, LookupStrategy};
use palette_tui::{InternalEvent, LookupEvent, PaletteRuntime};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use tracing::debug;

const NO_LOOKUP: u64 = 0;

// Only the most recently spawned request may report back.
pub struct SourceRuntime {
    source: Arc<dyn AnswerSource>,
    delay: Duration,
    current: Arc<AtomicU64>,
}

impl SourceRuntime {
    pub fn new(source: Arc<dyn AnswerSource>, delay: Duration) -> Self {
        Self {
            source,
            delay,
            current: Arc::new(AtomicU64::new(NO_LOOKUP)),
        }
    }
}

pub fn build_source(
    strategy: LookupStrategy,
    config: &Config,
    tasks: &[String],
) -> Result<Arc<dyn AnswerSource>> {
    match strategy {
        LookupStrategy::Canned => Ok(Arc::new(CannedAnswers::for_tasks(tasks))),
        LookupStrategy::Remote => {
            let client =
                palette_chat::Client::new(config.backend_base_url(), config.backend_timeout()?)?;
            Ok(Arc::new(client))
        }
    }
}

pub fn lookup_delay(strategy: LookupStrategy, config: &Config) -> Result<Duration> {
    match strategy {
        LookupStrategy::Canned => config.lookup_delay(),
        LookupStrategy::Remote => Ok(Duration::ZERO),
    }
}

impl PaletteRuntime for SourceRuntime {
    fn strategy(&self) -> LookupStrategy {
        self.source.strategy()
    }

    fn spawn_lookup(
        &mut self,
        request_id: u64,
        question: &str,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        self.current.store(request_id, Ordering::SeqCst);
        let source = Arc::clone(&self.source);
        let current = Arc::clone(&self.current);
        let delay = self.delay;
        let question = question.to_owned();

        thread::Builder::new()
            .name(format!("lookup-{request_id}"))
            .spawn(move || {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                if current.load(Ordering::SeqCst) != request_id {
                    debug!(request_id, "lookup dropped before resolving");
                    return;
                }

                let event = match source.answer(&question) {
                    Ok(answer) => LookupEvent::Completed { request_id, answer },
                    Err(error) => LookupEvent::Failed {
                        request_id,
                        error: format!("{error:#}"),
                    },
                };
                if current.load(Ordering::SeqCst) != request_id {
                    debug!(request_id, "lookup dropped after resolving");
                    return;
                }
                let _ = tx.send(InternalEvent::Lookup(event));
            })
            .context("spawn lookup worker")?;
        Ok(())
    }

    fn cancel_lookup(&mut self, request_id: u64) -> Result<()> {
        let _ = self.current.compare_exchange(
            request_id,
            NO_LOOKUP,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        Ok(())
    }
}
