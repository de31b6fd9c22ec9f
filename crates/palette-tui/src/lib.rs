// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use palette_app::{
    CommandGroup, LookupPhase, LookupStrategy, LookupTarget, NavCommand, NavEvent, Navigator, Page,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;
use tracing::{debug, info};

const BOUNCE_DURATION: Duration = Duration::from_millis(100);
const STATUS_TTL: Duration = Duration::from_secs(4);
const LOADING_MESSAGE: &str = "loading page...";
const EMPTY_MESSAGE: &str = "No results found.";
const TRANSCRIPT_TAIL: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupEvent {
    Completed { request_id: u64, answer: String },
    Failed { request_id: u64, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    EndBounce { token: u64 },
    Lookup(LookupEvent),
}

pub trait PaletteRuntime {
    fn strategy(&self) -> LookupStrategy;
    fn spawn_lookup(
        &mut self,
        request_id: u64,
        question: &str,
        tx: Sender<InternalEvent>,
    ) -> Result<()>;
    fn cancel_lookup(&mut self, _request_id: u64) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    strategy: LookupStrategy,
    cursor: usize,
    status_line: Option<String>,
    status_token: u64,
    bouncing: bool,
    bounce_token: u64,
}

impl ViewData {
    fn new(strategy: LookupStrategy) -> Self {
        Self {
            strategy,
            cursor: 0,
            status_line: None,
            status_token: 0,
            bouncing: false,
            bounce_token: 0,
        }
    }
}

pub fn run_app<R: PaletteRuntime>(navigator: &mut Navigator, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(runtime.strategy());
    let (internal_tx, internal_rx) = mpsc::channel();
    info!(strategy = view_data.strategy.as_str(), "palette started");

    let mut result = Ok(());
    loop {
        process_internal_events(navigator, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, &*navigator, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(50)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if handle_key_event(navigator, runtime, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    if let Some(lookup) = navigator.lookup().in_flight() {
        let _ = runtime.cancel_lookup(lookup.request_id);
    }
    info!("palette closed");

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: PaletteRuntime>(
    navigator: &mut Navigator,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::EndBounce { token } if token == view_data.bounce_token => {
                view_data.bouncing = false;
            }
            InternalEvent::EndBounce { .. } => {}
            InternalEvent::Lookup(LookupEvent::Completed { request_id, answer }) => {
                dispatch_and_apply(
                    navigator,
                    runtime,
                    view_data,
                    tx,
                    NavCommand::CompleteLookup { request_id, answer },
                );
            }
            InternalEvent::Lookup(LookupEvent::Failed { request_id, error }) => {
                dispatch_and_apply(
                    navigator,
                    runtime,
                    view_data,
                    tx,
                    NavCommand::FailLookup { request_id, error },
                );
            }
        }
    }
}

// A spawn failure feeds a FailLookup back in, hence the queue.
fn dispatch_and_apply<R: PaletteRuntime>(
    navigator: &mut Navigator,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: NavCommand,
) {
    let mut pending = VecDeque::from([command]);
    while let Some(command) = pending.pop_front() {
        for event in navigator.dispatch(command) {
            match event {
                NavEvent::PageChanged(_) | NavEvent::QueryChanged(_) => {
                    view_data.cursor = 0;
                }
                NavEvent::LookupStarted {
                    request_id,
                    question,
                    target,
                } => {
                    debug!(request_id, ?target, "spawning lookup");
                    if let Err(error) = runtime.spawn_lookup(request_id, &question, tx.clone()) {
                        pending.push_back(NavCommand::FailLookup {
                            request_id,
                            error: format!("{error:#}"),
                        });
                    }
                }
                NavEvent::LookupCanceled { request_id } => {
                    let _ = runtime.cancel_lookup(request_id);
                }
                NavEvent::LookupFailed { error, .. } => {
                    emit_status(view_data, tx, format!("lookup failed: {error}"));
                }
                NavEvent::ConversationCleared => {
                    emit_status(view_data, tx, "new conversation");
                }
                NavEvent::LookupResolved { .. } | NavEvent::LookupDiscarded { .. } => {}
            }
        }
    }
}

fn schedule(tx: &Sender<InternalEvent>, delay: Duration, event: InternalEvent) {
    let sender = tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(event);
    });
}

fn emit_status(view_data: &mut ViewData, tx: &Sender<InternalEvent>, message: impl Into<String>) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule(
        tx,
        STATUS_TTL,
        InternalEvent::ClearStatus {
            token: view_data.status_token,
        },
    );
}

fn bounce(view_data: &mut ViewData, tx: &Sender<InternalEvent>) {
    view_data.bouncing = true;
    view_data.bounce_token = view_data.bounce_token.saturating_add(1);
    schedule(
        tx,
        BOUNCE_DURATION,
        InternalEvent::EndBounce {
            token: view_data.bounce_token,
        },
    );
}

fn handle_key_event<R: PaletteRuntime>(
    navigator: &mut Navigator,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        let command = match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('t') => Some(NavCommand::Push(Page::Tasks)),
            KeyCode::Char('r') => Some(NavCommand::Push(Page::SearchResources)),
            KeyCode::Char('a') => Some(NavCommand::OpenAsk),
            KeyCode::Char('n') => Some(NavCommand::NewConversation),
            KeyCode::Char('c') => {
                if navigator.is_loading() {
                    dispatch_and_apply(navigator, runtime, view_data, tx, NavCommand::CancelLookup);
                    emit_status(view_data, tx, "lookup canceled");
                } else {
                    emit_status(view_data, tx, "nothing to cancel");
                }
                None
            }
            _ => None,
        };
        if let Some(command) = command {
            dispatch_and_apply(navigator, runtime, view_data, tx, command);
        }
        return false;
    }

    match key.code {
        KeyCode::Enter => {
            bounce(view_data, tx);
            if let Some(command) = activation_command(navigator, view_data.cursor) {
                dispatch_and_apply(navigator, runtime, view_data, tx, command);
            }
        }
        KeyCode::Backspace => {
            if navigator.is_home() {
                let mut query = navigator.query().to_owned();
                query.pop();
                dispatch_and_apply(navigator, runtime, view_data, tx, NavCommand::SetQuery(query));
            } else {
                dispatch_and_apply(navigator, runtime, view_data, tx, NavCommand::Pop);
                bounce(view_data, tx);
            }
        }
        KeyCode::Esc => {
            dispatch_and_apply(navigator, runtime, view_data, tx, NavCommand::GoHome);
        }
        KeyCode::Up => move_cursor(navigator, view_data, -1),
        KeyCode::Down => move_cursor(navigator, view_data, 1),
        KeyCode::Char(ch)
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
        {
            let mut query = navigator.query().to_owned();
            query.push(ch);
            dispatch_and_apply(navigator, runtime, view_data, tx, NavCommand::SetQuery(query));
        }
        _ => {}
    }
    false
}

fn activation_command(navigator: &Navigator, cursor: usize) -> Option<NavCommand> {
    match navigator.active_page() {
        Page::Home => navigator
            .visible_commands()
            .get(cursor)
            .map(|command| match command.target {
                Page::Help => NavCommand::OpenAsk,
                target => NavCommand::Push(target),
            }),
        Page::Tasks => navigator
            .visible_tasks()
            .get(cursor)
            .map(|task| NavCommand::SelectTask((*task).to_owned())),
        Page::Help => {
            let question = navigator.query().trim();
            if question.is_empty() {
                None
            } else {
                Some(NavCommand::Ask(question.to_owned()))
            }
        }
        Page::TaskMetrics
        | Page::SearchResources
        | Page::ResourceMetrics
        | Page::TaskDetail => None,
    }
}

fn selectable_len(navigator: &Navigator) -> usize {
    match navigator.active_page() {
        Page::Home => navigator.visible_commands().len(),
        Page::Tasks => navigator.visible_tasks().len(),
        _ => 0,
    }
}

fn move_cursor(navigator: &Navigator, view_data: &mut ViewData, delta: isize) {
    let len = selectable_len(navigator);
    if len == 0 {
        view_data.cursor = 0;
        return;
    }
    let next = (view_data.cursor as isize + delta).clamp(0, len as isize - 1);
    view_data.cursor = next as usize;
}

fn render(frame: &mut ratatui::Frame<'_>, navigator: &Navigator, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());

    // A slightly smaller frame stands in for the press feedback.
    let (percent_x, percent_y) = if view_data.bouncing { (67, 67) } else { (70, 70) };
    let area = centered_rect(percent_x, percent_y, layout[0]);
    frame.render_widget(Clear, area);

    let border = if view_data.bouncing {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let block = Block::default()
        .title(render_breadcrumb_text(navigator))
        .borders(Borders::ALL)
        .border_style(border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let input = Paragraph::new(render_input_text(navigator))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(input, sections[0]);

    let body = Paragraph::new(render_page_text(navigator, view_data)).wrap(Wrap { trim: false });
    frame.render_widget(body, sections[1]);

    let hints = Paragraph::new(hint_text(navigator.active_page()))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hints, sections[2]);

    let status = Paragraph::new(status_text(view_data)).style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, layout[1]);
}

fn render_breadcrumb_text(navigator: &Navigator) -> String {
    let trail = navigator
        .pages()
        .as_slice()
        .iter()
        .map(|page| page.label())
        .collect::<Vec<_>>()
        .join(" › ");
    format!(" palette: {trail} ")
}

fn render_input_text(navigator: &Navigator) -> String {
    let query = navigator.query();
    if !query.is_empty() {
        return format!("> {query}");
    }
    let placeholder = match navigator.active_page() {
        Page::Home => "Type a command or search...",
        Page::Tasks => "Search tasks...",
        Page::Help => "Ask a question...",
        _ => "",
    };
    format!("> {placeholder}")
}

fn render_page_text(navigator: &Navigator, view_data: &ViewData) -> String {
    match navigator.active_page() {
        Page::Home => render_home_text(navigator, view_data.cursor),
        Page::Tasks => render_tasks_text(navigator, view_data.cursor),
        Page::TaskDetail => render_detail_text(navigator),
        Page::Help => render_conversation_text(navigator),
        Page::TaskMetrics => render_task_metrics_text(navigator, view_data.strategy),
        Page::SearchResources => "Resource search has no data source configured.".to_owned(),
        Page::ResourceMetrics => "No resource metrics have been collected.".to_owned(),
    }
}

fn render_home_text(navigator: &Navigator, cursor: usize) -> String {
    let commands = navigator.visible_commands();
    if commands.is_empty() {
        return EMPTY_MESSAGE.to_owned();
    }

    let mut lines = Vec::new();
    let mut current_group: Option<CommandGroup> = None;
    for (index, command) in commands.iter().enumerate() {
        if current_group != Some(command.group) {
            if current_group.is_some() {
                lines.push(String::new());
            }
            lines.push(command.group.label().to_owned());
            current_group = Some(command.group);
        }
        let prefix = if index == cursor { "> " } else { "  " };
        let line = format!("{prefix}{:<28}{}", command.label, command.shortcut);
        lines.push(line.trim_end().to_owned());
    }
    lines.join("\n")
}

fn render_tasks_text(navigator: &Navigator, cursor: usize) -> String {
    let mut lines = Vec::new();
    if navigator.is_loading() {
        lines.push(LOADING_MESSAGE.to_owned());
        lines.push(String::new());
    }
    let tasks = navigator.visible_tasks();
    if tasks.is_empty() {
        lines.push(EMPTY_MESSAGE.to_owned());
    }
    for (index, task) in tasks.iter().enumerate() {
        let prefix = if index == cursor { "> " } else { "  " };
        lines.push(format!("{prefix}{}", task.trim()));
    }
    lines.join("\n")
}

fn render_detail_text(navigator: &Navigator) -> String {
    if navigator.current_task().is_empty() {
        return "(no answer)".to_owned();
    }
    navigator.current_task().to_owned()
}

fn render_conversation_text(navigator: &Navigator) -> String {
    let messages = navigator.messages();
    let mut lines = Vec::new();
    if messages.is_empty() {
        lines.push("Ask anything about your tasks.".to_owned());
    }
    let format = format_description!("[hour]:[minute]");
    let keep = messages.len().saturating_sub(TRANSCRIPT_TAIL);
    for message in messages.iter().skip(keep) {
        let stamp = message
            .sent_at
            .format(format)
            .unwrap_or_else(|_| "--:--".to_owned());
        lines.push(format!(
            "[{stamp}] {}: {}",
            message.sender.label(),
            message.content
        ));
    }
    if navigator.is_loading() {
        lines.push("bot: ...".to_owned());
    }
    lines.join("\n")
}

fn render_task_metrics_text(navigator: &Navigator, strategy: LookupStrategy) -> String {
    let lookup = match navigator.lookup() {
        LookupPhase::Idle => "idle".to_owned(),
        LookupPhase::Loading(lookup) => match lookup.target {
            LookupTarget::TaskDetail => format!("loading #{}", lookup.request_id),
            LookupTarget::Conversation => format!("asking #{}", lookup.request_id),
        },
        LookupPhase::Resolved { request_id } => format!("resolved #{request_id}"),
        LookupPhase::Failed { request_id, .. } => format!("failed #{request_id}"),
    };
    [
        format!("tasks: {}", navigator.tasks().len()),
        format!("matching query: {}", navigator.visible_tasks().len()),
        format!("messages: {}", navigator.messages().len()),
        format!("strategy: {}", strategy.as_str()),
        format!("lookup: {lookup}"),
    ]
    .join("\n")
}

fn hint_text(page: Page) -> &'static str {
    match page {
        Page::Home => "enter open | ^T tasks | ^R resources | ^A ask | ^Q quit",
        Page::Tasks => "enter look up | up/down move | backspace back | esc home",
        Page::Help => "enter send | ^N new conversation | backspace back | esc home",
        _ => "backspace back | esc home",
    }
}

fn status_text(view_data: &ViewData) -> String {
    view_data.status_line.clone().unwrap_or_default()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        InternalEvent, LookupEvent, PaletteRuntime, ViewData, handle_key_event,
        process_internal_events, render, render_breadcrumb_text, render_home_text,
        render_input_text, render_page_text, render_tasks_text,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use palette_app::{LookupStrategy, MessageSender, Navigator, Page};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;
    use std::sync::mpsc;

    #[derive(Debug, Default)]
    struct TestRuntime {
        answers: VecDeque<Result<String, String>>,
        questions: Vec<String>,
        canceled: Vec<u64>,
        defer: bool,
        spawn_error: Option<String>,
    }

    impl TestRuntime {
        fn resolve(&mut self, question: &str) -> anyhow::Result<String> {
            self.questions.push(question.to_owned());
            match self.answers.pop_front() {
                Some(Ok(answer)) => Ok(answer),
                Some(Err(error)) => Err(anyhow::anyhow!("{error}")),
                None => Ok(question.to_owned()),
            }
        }
    }

    impl PaletteRuntime for TestRuntime {
        fn strategy(&self) -> LookupStrategy {
            LookupStrategy::Canned
        }

        fn spawn_lookup(
            &mut self,
            request_id: u64,
            question: &str,
            tx: mpsc::Sender<InternalEvent>,
        ) -> anyhow::Result<()> {
            if let Some(error) = self.spawn_error.take() {
                return Err(anyhow::anyhow!("{error}"));
            }
            if self.defer {
                self.questions.push(question.to_owned());
                return Ok(());
            }
            let answer = self.resolve(question);
            let event = match answer {
                Ok(answer) => LookupEvent::Completed { request_id, answer },
                Err(error) => LookupEvent::Failed {
                    request_id,
                    error: error.to_string(),
                },
            };
            tx.send(InternalEvent::Lookup(event))
                .map_err(|_| anyhow::anyhow!("closed"))?;
            Ok(())
        }

        fn cancel_lookup(&mut self, request_id: u64) -> anyhow::Result<()> {
            self.canceled.push(request_id);
            Ok(())
        }
    }

    struct Harness {
        navigator: Navigator,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                navigator: Navigator::default(),
                runtime,
                view_data: ViewData::new(LookupStrategy::Canned),
                tx,
                rx,
            }
        }

        fn press(&mut self, key: KeyEvent) -> bool {
            let quit = handle_key_event(
                &mut self.navigator,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                key,
            );
            self.pump();
            quit
        }

        fn pump(&mut self) {
            process_internal_events(
                &mut self.navigator,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
        }

        fn key(&mut self, code: KeyCode) -> bool {
            self.press(KeyEvent::new(code, KeyModifiers::NONE))
        }

        fn ctrl(&mut self, ch: char) -> bool {
            self.press(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.key(KeyCode::Char(ch));
            }
        }

        fn send(&mut self, event: InternalEvent) {
            self.tx.send(event).expect("send internal event");
            self.pump();
        }
    }

    #[test]
    fn ctrl_t_opens_tasks_and_backspace_returns_home() {
        let mut harness = Harness::new(TestRuntime::default());

        harness.ctrl('t');
        assert_eq!(harness.navigator.active_page(), Page::Tasks);

        harness.key(KeyCode::Backspace);
        assert_eq!(harness.navigator.active_page(), Page::Home);
        assert!(harness.view_data.bouncing);
    }

    #[test]
    fn backspace_on_home_edits_query_instead_of_popping() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.type_text("tasks");
        harness.key(KeyCode::Backspace);
        assert_eq!(harness.navigator.query(), "task");
        assert_eq!(harness.navigator.pages().len(), 1);
    }

    #[test]
    fn ctrl_q_quits() {
        let mut harness = Harness::new(TestRuntime::default());
        assert!(harness.ctrl('q'));
        assert!(!harness.ctrl('t'));
    }

    #[test]
    fn typing_filters_home_commands() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.type_text("metrics");

        let text = render_home_text(&harness.navigator, harness.view_data.cursor);
        assert!(text.contains("See Tasks Metrics"));
        assert!(text.contains("See Resources Metrics"));
        assert!(!text.contains("Search Tasks..."));

        harness.type_text("zzz");
        let text = render_home_text(&harness.navigator, harness.view_data.cursor);
        assert_eq!(text, "No results found.");
    }

    #[test]
    fn enter_on_home_opens_highlighted_command() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.key(KeyCode::Down);
        harness.key(KeyCode::Enter);
        assert_eq!(harness.navigator.active_page(), Page::TaskMetrics);

        harness.key(KeyCode::Esc);
        harness.type_text("find");
        harness.key(KeyCode::Enter);
        assert_eq!(harness.navigator.active_page(), Page::Help);
    }

    #[test]
    fn selecting_a_task_resolves_and_shows_detail() {
        let runtime = TestRuntime {
            answers: VecDeque::from([Ok("8 tarefas".to_owned())]),
            ..TestRuntime::default()
        };
        let mut harness = Harness::new(runtime);

        harness.ctrl('t');
        harness.type_text("no total");
        harness.key(KeyCode::Enter);

        assert_eq!(
            harness.runtime.questions,
            vec!["Quantas tarefas existem no total?".to_owned()]
        );
        assert_eq!(harness.navigator.active_page(), Page::TaskDetail);
        assert_eq!(harness.navigator.current_task(), "8 tarefas");
        assert!(!harness.navigator.is_loading());
        assert_eq!(
            render_page_text(&harness.navigator, &harness.view_data),
            "8 tarefas"
        );
    }

    #[test]
    fn failed_lookup_reports_status_and_stays_on_tasks() {
        let runtime = TestRuntime {
            answers: VecDeque::from([Err("cannot reach chat backend".to_owned())]),
            ..TestRuntime::default()
        };
        let mut harness = Harness::new(runtime);

        harness.ctrl('t');
        harness.key(KeyCode::Enter);

        assert_eq!(harness.navigator.pages().as_slice(), &[Page::Home, Page::Tasks]);
        assert!(!harness.navigator.is_loading());
        assert!(
            harness
                .view_data
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("lookup failed: cannot reach"))
        );
    }

    #[test]
    fn spawn_failure_becomes_failed_lookup() {
        let runtime = TestRuntime {
            spawn_error: Some("worker unavailable".to_owned()),
            ..TestRuntime::default()
        };
        let mut harness = Harness::new(runtime);

        harness.ctrl('t');
        harness.key(KeyCode::Enter);

        assert!(!harness.navigator.is_loading());
        assert_eq!(harness.navigator.active_page(), Page::Tasks);
        assert_eq!(
            harness.view_data.status_line.as_deref(),
            Some("lookup failed: worker unavailable")
        );
    }

    #[test]
    fn deferred_lookup_shows_loading_until_completion() {
        let runtime = TestRuntime {
            defer: true,
            ..TestRuntime::default()
        };
        let mut harness = Harness::new(runtime);

        harness.ctrl('t');
        harness.key(KeyCode::Enter);
        assert!(harness.navigator.is_loading());
        assert!(render_tasks_text(&harness.navigator, 0).starts_with("loading page..."));

        let request_id = harness
            .navigator
            .lookup()
            .in_flight()
            .map(|lookup| lookup.request_id)
            .expect("lookup in flight");
        harness.send(InternalEvent::Lookup(LookupEvent::Completed {
            request_id,
            answer: "resposta".to_owned(),
        }));
        assert_eq!(harness.navigator.active_page(), Page::TaskDetail);
        assert!(!harness.navigator.is_loading());
    }

    #[test]
    fn leaving_tasks_cancels_deferred_lookup_and_ignores_late_answer() {
        let runtime = TestRuntime {
            defer: true,
            ..TestRuntime::default()
        };
        let mut harness = Harness::new(runtime);

        harness.ctrl('t');
        harness.key(KeyCode::Enter);
        let request_id = harness
            .navigator
            .lookup()
            .in_flight()
            .map(|lookup| lookup.request_id)
            .expect("lookup in flight");

        harness.key(KeyCode::Backspace);
        assert_eq!(harness.runtime.canceled, vec![request_id]);
        assert!(!harness.navigator.is_loading());

        harness.send(InternalEvent::Lookup(LookupEvent::Completed {
            request_id,
            answer: "late".to_owned(),
        }));
        assert_eq!(harness.navigator.pages().as_slice(), &[Page::Home]);
    }

    #[test]
    fn ctrl_c_cancels_in_flight_lookup() {
        let runtime = TestRuntime {
            defer: true,
            ..TestRuntime::default()
        };
        let mut harness = Harness::new(runtime);

        harness.ctrl('t');
        harness.key(KeyCode::Enter);
        harness.ctrl('c');
        assert!(!harness.navigator.is_loading());
        assert_eq!(harness.view_data.status_line.as_deref(), Some("lookup canceled"));

        harness.ctrl('c');
        assert_eq!(
            harness.view_data.status_line.as_deref(),
            Some("nothing to cancel")
        );
    }

    #[test]
    fn ask_page_runs_a_conversation_and_ctrl_n_resets_it() {
        let runtime = TestRuntime {
            answers: VecDeque::from([Ok("3 lojas".to_owned())]),
            ..TestRuntime::default()
        };
        let mut harness = Harness::new(runtime);

        harness.ctrl('a');
        harness.type_text("quantas lojas?");
        harness.key(KeyCode::Enter);

        assert_eq!(harness.navigator.active_page(), Page::Help);
        assert!(harness.navigator.query().is_empty());
        let senders: Vec<MessageSender> = harness
            .navigator
            .messages()
            .iter()
            .map(|message| message.sender)
            .collect();
        assert_eq!(senders, vec![MessageSender::User, MessageSender::Bot]);
        let transcript = render_page_text(&harness.navigator, &harness.view_data);
        assert!(transcript.contains("you: quantas lojas?"));
        assert!(transcript.contains("bot: 3 lojas"));

        harness.ctrl('n');
        assert!(harness.navigator.messages().is_empty());
        assert_eq!(
            harness.view_data.status_line.as_deref(),
            Some("new conversation")
        );
    }

    #[test]
    fn ctrl_a_during_pending_question_resets_loading() {
        let runtime = TestRuntime {
            defer: true,
            ..TestRuntime::default()
        };
        let mut harness = Harness::new(runtime);

        harness.ctrl('a');
        harness.type_text("oi");
        harness.key(KeyCode::Enter);
        let request_id = harness
            .navigator
            .lookup()
            .in_flight()
            .map(|lookup| lookup.request_id)
            .expect("question in flight");

        harness.ctrl('a');
        assert!(!harness.navigator.is_loading());
        assert_eq!(harness.runtime.canceled, vec![request_id]);
        assert_eq!(harness.navigator.active_page(), Page::Help);
    }

    #[test]
    fn returning_home_from_a_search_shows_every_command() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.ctrl('t');
        harness.type_text("no total");
        assert_eq!(harness.navigator.visible_tasks().len(), 1);

        harness.key(KeyCode::Backspace);
        assert_eq!(harness.navigator.active_page(), Page::Home);
        assert_eq!(
            render_input_text(&harness.navigator),
            "> Type a command or search..."
        );
        let text = render_home_text(&harness.navigator, harness.view_data.cursor);
        assert!(text.contains("Search Tasks..."));
        assert!(text.contains("Ask to find..."));
    }

    #[test]
    fn enter_on_empty_ask_page_sends_nothing() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.ctrl('a');
        harness.key(KeyCode::Enter);
        assert!(harness.runtime.questions.is_empty());
        assert!(harness.view_data.bouncing);
    }

    #[test]
    fn stale_bounce_and_status_timers_are_ignored() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.key(KeyCode::Enter);
        harness.key(KeyCode::Esc);
        let first = harness.view_data.bounce_token;
        harness.ctrl('t');
        harness.key(KeyCode::Enter);
        assert!(harness.view_data.bounce_token > first);

        harness.send(InternalEvent::EndBounce { token: first });
        assert!(harness.view_data.bouncing);
        let current = harness.view_data.bounce_token;
        harness.send(InternalEvent::EndBounce { token: current });
        assert!(!harness.view_data.bouncing);

        harness.ctrl('c');
        let token = harness.view_data.status_token;
        harness.send(InternalEvent::ClearStatus { token: token + 1 });
        assert!(harness.view_data.status_line.is_some());
        harness.send(InternalEvent::ClearStatus { token });
        assert!(harness.view_data.status_line.is_none());
    }

    #[test]
    fn cursor_is_clamped_and_reset_on_query_change() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.ctrl('t');
        for _ in 0..20 {
            harness.key(KeyCode::Down);
        }
        assert_eq!(harness.view_data.cursor, 7);
        harness.key(KeyCode::Up);
        assert_eq!(harness.view_data.cursor, 6);

        harness.type_text("l");
        assert_eq!(harness.view_data.cursor, 0);
    }

    #[test]
    fn breadcrumb_and_input_follow_the_stack() {
        let mut harness = Harness::new(TestRuntime::default());
        assert_eq!(
            render_input_text(&harness.navigator),
            "> Type a command or search..."
        );
        harness.ctrl('t');
        assert_eq!(
            render_breadcrumb_text(&harness.navigator),
            " palette: home › tasks "
        );
        harness.type_text("loja");
        assert_eq!(render_input_text(&harness.navigator), "> loja");
    }

    #[test]
    fn home_renders_into_terminal_buffer() -> anyhow::Result<()> {
        let navigator = Navigator::default();
        let view_data = ViewData::new(LookupStrategy::Remote);
        let mut terminal = Terminal::new(TestBackend::new(100, 30))?;
        terminal.draw(|frame| render(frame, &navigator, &view_data))?;

        let screen: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("Search Tasks..."));
        assert!(screen.contains("Ask to find..."));
        assert!(screen.contains("palette: home"));
        Ok(())
    }

    #[test]
    fn metrics_page_summarizes_state() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.type_text("tasks metrics");
        harness.key(KeyCode::Enter);
        assert_eq!(harness.navigator.active_page(), Page::TaskMetrics);

        let text = render_page_text(&harness.navigator, &harness.view_data);
        assert!(text.contains("tasks: 8"));
        assert!(text.contains("strategy: canned"));
        assert!(text.contains("lookup: idle"));
    }
}
