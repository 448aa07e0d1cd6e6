use crate::kanban_board::KanbanBoard;
use crate::storage::Storage;
use crate::task::{Task, TaskDraft, TaskStatus};
use chrono::{NaiveDate, NaiveDateTime};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io::{self, BufRead, Write};

const HELP: &str =
    "←/→ column  ↑/↓ task  a add  e edit  d delete  n/Enter next  p previous  q quit";

/// Asks the user for one line of text.
pub trait Prompt {
    /// `current` is shown as the value kept when the answer is empty.
    fn ask(&mut self, message: &str, current: &str) -> Option<String>;
}

/// Reads answers from stdin with raw mode temporarily switched off.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, message: &str, current: &str) -> Option<String> {
        disable_raw_mode().ok();
        if current.is_empty() {
            print!("{message}: ");
        } else {
            print!("{message} [{current}]: ");
        }
        io::stdout().flush().ok();
        let answer = read_answer(&mut io::stdin().lock());
        enable_raw_mode().ok();
        answer
    }
}

/// One trimmed line, or `None` once the input is closed.
fn read_answer<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut input = String::new();
    match reader.read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// View state of the board: which column and card are selected.
#[derive(Debug, Default)]
pub struct App {
    pub selected_status: usize,
    pub selected_task: usize,
    /// Last error shown in the footer.
    pub message: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_column(&self) -> TaskStatus {
        TaskStatus::ALL[self.selected_status]
    }

    pub fn selected<'a, S: Storage>(&self, board: &'a KanbanBoard<S>) -> Option<&'a Task> {
        board
            .get_tasks_by_status(self.selected_column())
            .get(self.selected_task)
            .copied()
    }

    /// Keeps the card selection inside the selected column.
    pub fn clamp<S: Storage>(&mut self, board: &KanbanBoard<S>) {
        let len = board.get_tasks_by_status(self.selected_column()).len();
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    pub fn handle_key<S: Storage, P: Prompt>(
        &mut self,
        key: KeyCode,
        board: &mut KanbanBoard<S>,
        prompt: &mut P,
    ) -> Control {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_status = self.selected_status.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.selected_status < TaskStatus::ALL.len() - 1 {
                    self.selected_status += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_task = self.selected_task.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_task += 1;
            }
            KeyCode::Char('a') => self.add(board, prompt),
            KeyCode::Char('e') => self.edit(board, prompt),
            KeyCode::Char('d') => {
                if let Some(id) = self.selected(board).map(|t| t.id.clone()) {
                    let result = board.delete_task(&id);
                    self.report(result);
                }
            }
            KeyCode::Char('n') | KeyCode::Enter => self.shift(board, TaskStatus::next),
            KeyCode::Char('p') => self.shift(board, TaskStatus::previous),
            _ => {}
        }
        self.clamp(board);
        Control::Continue
    }

    fn add<S: Storage, P: Prompt>(&mut self, board: &mut KanbanBoard<S>, prompt: &mut P) {
        let Some(title) = prompt.ask("Task title", "") else {
            return;
        };
        let Some(description) = prompt.ask("Task description", "") else {
            return;
        };
        let Some(deadline) = prompt.ask("Deadline (YYYY-MM-DDTHH:MM)", "") else {
            return;
        };
        let draft = TaskDraft::new(title)
            .description(description)
            .deadline(deadline);
        let result = board.add_task(draft);
        self.report(result);
    }

    fn edit<S: Storage, P: Prompt>(&mut self, board: &mut KanbanBoard<S>, prompt: &mut P) {
        let Some(mut task) = self.selected(board).cloned() else {
            return;
        };
        for (message, field) in [
            ("Title", &mut task.title),
            ("Description", &mut task.description),
            ("Deadline", &mut task.deadline),
        ] {
            match prompt.ask(message, field) {
                Some(answer) if !answer.is_empty() => *field = answer,
                Some(_) => {}
                None => return,
            }
        }
        match prompt.ask("Status (todo/inprogress/done)", task.status.as_str()) {
            Some(answer) if !answer.is_empty() => match answer.parse() {
                Ok(status) => task.status = status,
                Err(err) => tracing::debug!("Keeping status: {}", err),
            },
            Some(_) => {}
            None => return,
        }
        let result = board.update_task(task);
        self.report(result);
    }

    fn shift<S: Storage>(
        &mut self,
        board: &mut KanbanBoard<S>,
        target: fn(TaskStatus) -> Option<TaskStatus>,
    ) {
        let Some(task) = self.selected(board) else {
            return;
        };
        let Some(status) = target(task.status) else {
            return;
        };
        let id = task.id.clone();
        let result = board.move_task(&id, status);
        self.report(result);
    }

    fn report<T>(&mut self, result: crate::error::Result<T>) {
        match result {
            Ok(_) => self.message = None,
            Err(err) => {
                tracing::warn!("Failed to save tasks: {}", err);
                self.message = Some(format!("Failed to save tasks: {err}"));
            }
        }
    }
}

/// Renders a stored deadline as local date and time.
pub fn format_deadline(deadline: &str) -> String {
    let deadline = deadline.trim();
    let parsed = NaiveDateTime::parse_from_str(deadline, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(deadline, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(deadline, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });
    match parsed {
        Some(dt) => dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => "Invalid Date".to_string(),
    }
}

fn card(task: &Task) -> ListItem<'_> {
    ListItem::new(vec![
        Line::from(Span::styled(
            task.title.as_str(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(task.description.as_str()),
        Line::from(Span::styled(
            format!("Deadline: {}", format_deadline(&task.deadline)),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ])
}

fn draw<S: Storage>(f: &mut Frame, board: &KanbanBoard<S>, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[0]);

    for (i, status) in TaskStatus::ALL.iter().enumerate() {
        let items: Vec<ListItem> = board
            .get_tasks_by_status(*status)
            .into_iter()
            .map(card)
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(status.title())
                    .borders(Borders::ALL)
                    .border_style(if app.selected_status == i {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(Style::default().bg(Color::DarkGray));

        let mut state = ListState::default();
        if app.selected_status == i {
            state.select(Some(app.selected_task));
        }
        f.render_stateful_widget(list, chunks[i], &mut state);
    }

    let footer = match &app.message {
        Some(message) => Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(footer, rows[1]);
}

pub fn run_app<B: Backend, S: Storage>(
    terminal: &mut Terminal<B>,
    board: &mut KanbanBoard<S>,
) -> io::Result<()> {
    let mut app = App::new();
    let mut prompt = StdinPrompt;
    loop {
        terminal.draw(|f| draw(f, board, &app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key.code, board, &mut prompt) == Control::Quit {
                return Ok(());
            }
            // Prompts write over the alternate screen.
            terminal.clear()?;
        }
    }
}
