// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    ChatMessage, HomeCommand, InFlightLookup, LookupPhase, LookupTarget, Page, PageStack,
    default_tasks, filter_home_commands, filter_items,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    pages: PageStack,
    query: String,
    tasks: Vec<String>,
    lookup: LookupPhase,
    current_task: String,
    messages: Vec<ChatMessage>,
    next_request_id: u64,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::with_tasks(default_tasks())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    Push(Page),
    OpenAsk,
    Pop,
    GoHome,
    SetQuery(String),
    SelectTask(String),
    Ask(String),
    CompleteLookup { request_id: u64, answer: String },
    FailLookup { request_id: u64, error: String },
    CancelLookup,
    NewConversation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    PageChanged(Page),
    QueryChanged(String),
    LookupStarted {
        request_id: u64,
        question: String,
        target: LookupTarget,
    },
    LookupResolved {
        request_id: u64,
        target: LookupTarget,
    },
    LookupFailed {
        request_id: u64,
        error: String,
    },
    LookupCanceled {
        request_id: u64,
    },
    LookupDiscarded {
        request_id: u64,
    },
    ConversationCleared,
}

impl Navigator {
    pub fn with_tasks(tasks: Vec<String>) -> Self {
        Self {
            pages: PageStack::new(),
            query: String::new(),
            tasks,
            lookup: LookupPhase::Idle,
            current_task: String::new(),
            messages: Vec::new(),
            next_request_id: 0,
        }
    }

    pub fn pages(&self) -> &PageStack {
        &self.pages
    }

    pub fn active_page(&self) -> Page {
        self.pages.active()
    }

    pub fn is_home(&self) -> bool {
        self.pages.is_home()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    pub fn visible_tasks(&self) -> Vec<&str> {
        filter_items(&self.tasks, &self.query)
    }

    pub fn visible_commands(&self) -> Vec<HomeCommand> {
        filter_home_commands(&self.query)
    }

    pub fn lookup(&self) -> &LookupPhase {
        &self.lookup
    }

    pub fn is_loading(&self) -> bool {
        self.lookup.is_loading()
    }

    pub fn current_task(&self) -> &str {
        &self.current_task
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn dispatch(&mut self, command: NavCommand) -> Vec<NavEvent> {
        match command {
            NavCommand::Push(page) => {
                self.pages.push(page);
                debug!(page = page.as_str(), depth = self.pages.len(), "page pushed");
                self.page_changed()
            }
            NavCommand::OpenAsk => {
                let mut events = Vec::new();
                self.cancel_in_flight(&mut events);
                self.pages.push(Page::Help);
                debug!(depth = self.pages.len(), "ask page opened");
                events.extend(self.page_changed());
                events
            }
            NavCommand::Pop => {
                let Some(popped) = self.pages.pop() else {
                    debug!("pop ignored on last page");
                    return Vec::new();
                };
                debug!(
                    popped = popped.as_str(),
                    active = self.pages.active().as_str(),
                    "page popped"
                );
                self.page_changed()
            }
            NavCommand::GoHome => {
                if !self.pages.go_to_home() {
                    return Vec::new();
                }
                debug!(active = self.pages.active().as_str(), "went home");
                self.page_changed()
            }
            NavCommand::SetQuery(query) => {
                if query == self.query {
                    return Vec::new();
                }
                self.query = query;
                vec![NavEvent::QueryChanged(self.query.clone())]
            }
            NavCommand::SelectTask(item) => self.start_lookup(item, LookupTarget::TaskDetail),
            NavCommand::Ask(question) => {
                let question = question.trim().to_owned();
                if question.is_empty() {
                    return Vec::new();
                }
                self.start_lookup(question, LookupTarget::Conversation)
            }
            NavCommand::CompleteLookup { request_id, answer } => {
                self.complete_lookup(request_id, answer)
            }
            NavCommand::FailLookup { request_id, error } => self.fail_lookup(request_id, error),
            NavCommand::CancelLookup => {
                let mut events = Vec::new();
                self.cancel_in_flight(&mut events);
                events
            }
            NavCommand::NewConversation => {
                self.messages.clear();
                let mut events = vec![NavEvent::ConversationCleared];
                if !self.query.is_empty() {
                    self.query.clear();
                    events.push(NavEvent::QueryChanged(String::new()));
                }
                events
            }
        }
    }

    fn start_lookup(&mut self, question: String, target: LookupTarget) -> Vec<NavEvent> {
        let mut events = Vec::new();
        if let Some(previous) = self.lookup.in_flight() {
            debug!(
                superseded = previous.request_id,
                "new lookup replaces in-flight request"
            );
        }
        self.cancel_in_flight(&mut events);

        let request_id = self.next_request_id();
        self.messages.push(ChatMessage::user(question.clone()));
        self.lookup = LookupPhase::Loading(InFlightLookup {
            request_id,
            question: question.clone(),
            target,
            origin: self.pages.active(),
        });
        debug!(request_id, ?target, "lookup started");
        events.push(NavEvent::LookupStarted {
            request_id,
            question,
            target,
        });
        events
    }

    fn complete_lookup(&mut self, request_id: u64, answer: String) -> Vec<NavEvent> {
        let Some(lookup) = self.take_matching(request_id) else {
            warn!(request_id, "discarding result for stale lookup");
            return vec![NavEvent::LookupDiscarded { request_id }];
        };

        self.messages.push(ChatMessage::bot(answer.clone()));
        self.lookup = LookupPhase::Resolved { request_id };
        info!(request_id, target = ?lookup.target, "lookup resolved");

        let mut events = vec![NavEvent::LookupResolved {
            request_id,
            target: lookup.target,
        }];
        match lookup.target {
            LookupTarget::TaskDetail => {
                self.current_task = answer;
                self.pages.push(Page::TaskDetail);
                events.extend(self.page_changed());
            }
            LookupTarget::Conversation => {
                if self.query.trim() == lookup.question {
                    self.query.clear();
                    events.push(NavEvent::QueryChanged(String::new()));
                }
            }
        }
        events
    }

    fn fail_lookup(&mut self, request_id: u64, error: String) -> Vec<NavEvent> {
        if self.take_matching(request_id).is_none() {
            warn!(request_id, error = %error, "discarding failure for stale lookup");
            return vec![NavEvent::LookupDiscarded { request_id }];
        }

        warn!(request_id, error = %error, "lookup failed");
        self.lookup = LookupPhase::Failed {
            request_id,
            error: error.clone(),
        };
        vec![NavEvent::LookupFailed { request_id, error }]
    }

    fn take_matching(&mut self, request_id: u64) -> Option<InFlightLookup> {
        let matches = self
            .lookup
            .in_flight()
            .is_some_and(|lookup| lookup.request_id == request_id);
        if !matches {
            return None;
        }
        match std::mem::take(&mut self.lookup) {
            LookupPhase::Loading(lookup) => Some(lookup),
            _ => None,
        }
    }

    fn cancel_in_flight(&mut self, events: &mut Vec<NavEvent>) {
        if let LookupPhase::Loading(lookup) = std::mem::take(&mut self.lookup) {
            debug!(request_id = lookup.request_id, "lookup canceled");
            events.push(NavEvent::LookupCanceled {
                request_id: lookup.request_id,
            });
        }
    }

    // The query belongs to the page it was typed on, and a lookup only applies
    // to the page it was started from.
    fn page_changed(&mut self) -> Vec<NavEvent> {
        let mut events = vec![NavEvent::PageChanged(self.pages.active())];
        if !self.query.is_empty() {
            self.query.clear();
            events.push(NavEvent::QueryChanged(String::new()));
        }
        self.cancel_if_orphaned(&mut events);
        events
    }

    fn cancel_if_orphaned(&mut self, events: &mut Vec<NavEvent>) {
        let orphaned = self
            .lookup
            .in_flight()
            .is_some_and(|lookup| lookup.origin != self.pages.active());
        if orphaned {
            self.cancel_in_flight(events);
        }
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request_id = self.next_request_id.saturating_add(1);
        if self.next_request_id == 0 {
            self.next_request_id = 1;
        }
        self.next_request_id
    }
}
