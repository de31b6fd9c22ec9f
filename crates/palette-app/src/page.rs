// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Tasks,
    TaskMetrics,
    SearchResources,
    ResourceMetrics,
    TaskDetail,
    Help,
}

impl Page {
    pub const NON_HOME: [Self; 6] = [
        Self::Tasks,
        Self::TaskDetail,
        Self::TaskMetrics,
        Self::SearchResources,
        Self::ResourceMetrics,
        Self::Help,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Tasks => "tasks",
            Self::TaskMetrics => "taskMetrics",
            Self::SearchResources => "searchResources",
            Self::ResourceMetrics => "resourceMetrics",
            Self::TaskDetail => "Task Detail",
            Self::Help => "Help",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Tasks => "tasks",
            Self::TaskMetrics => "task metrics",
            Self::SearchResources => "resources",
            Self::ResourceMetrics => "resource metrics",
            Self::TaskDetail => "task detail",
            Self::Help => "ask",
        }
    }

    pub fn is_non_home(self) -> bool {
        Self::NON_HOME.contains(&self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStack {
    pages: Vec<Page>,
}

impl Default for PageStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStack {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::Home],
        }
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn pop(&mut self) -> Option<Page> {
        if self.pages.len() <= 1 {
            return None;
        }
        self.pages.pop()
    }

    pub fn active(&self) -> Page {
        self.pages.last().copied().unwrap_or(Page::Home)
    }

    pub fn is_home(&self) -> bool {
        self.active() == Page::Home
    }

    pub fn contains(&self, page: Page) -> bool {
        self.pages.contains(&page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn as_slice(&self) -> &[Page] {
        &self.pages
    }

    // Only the top page is popped; Home is pushed only when no Home entry is left.
    pub fn go_to_home(&mut self) -> bool {
        if !self.active().is_non_home() {
            return false;
        }
        self.pop();
        if !self.contains(Page::Home) {
            self.push(Page::Home);
        }
        true
    }
}
