// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use staffdesk_app::{
    ColumnSet, EditCommand, EditEffect, Editor, FEEDBACK_WINDOW, Feedback, FeedbackKind, FkFilter,
    RecordSource, ResourceKind, RowMode, SyncOutcome, SyncRequest, TableView, refresh_table,
    render_table,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

/// What the terminal front end needs from the outside world: reads through
/// [`RecordSource`], writes through [`AppRuntime::run_sync`].
pub trait AppRuntime: RecordSource {
    fn run_sync(&mut self, request: &SyncRequest) -> SyncOutcome;

    /// Runs the request and reports back over `tx`. Runtimes that talk to a
    /// network override this to move the call off the UI thread.
    fn spawn_sync(&mut self, request: SyncRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.run_sync(&request);
        tx.send(InternalEvent::SyncCompleted { request, outcome })
            .map_err(|_| anyhow!("sync event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    SyncCompleted {
        request: SyncRequest,
        outcome: SyncOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Row,
    Footer,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    kind: ResourceKind,
    columns: ColumnSet,
    table: TableView,
    filter: Option<FkFilter>,
    focus: Focus,
    selected_row: usize,
    selected_cell: usize,
    /// Identity of the row waiting on a y/n answer.
    confirm_delete: Option<String>,
    /// Blocking message; the next key dismisses it.
    alert: Option<String>,
    status: Option<Feedback>,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(initial: ResourceKind, runtime: &mut R) -> Result<()> {
    let mut view = load_view(runtime, initial)
        .with_context(|| format!("open the {} table", initial.label()))?;

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(runtime, &mut view, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, &view)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(runtime, &mut view, &internal_tx, key) {
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
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Fetches reference data, builds the descriptors and filter, then the table.
fn load_view<R: AppRuntime + ?Sized>(runtime: &mut R, kind: ResourceKind) -> Result<ViewData> {
    let references = kind.load_references(runtime)?;
    let columns = kind.columns(&references)?;
    let filter = kind.filter(&references);
    let endpoint = filter
        .as_ref()
        .map_or_else(|| kind.endpoint(), FkFilter::endpoint);
    let records = runtime
        .fetch_records(&endpoint)
        .with_context(|| format!("load {endpoint}"))?;
    let table = render_table(&records, &columns, None);
    tracing::debug!(table = kind.as_str(), rows = table.rows.len(), "loaded table");

    Ok(ViewData {
        kind,
        columns,
        table,
        filter,
        focus: Focus::Row,
        selected_row: 0,
        selected_cell: 0,
        confirm_delete: None,
        alert: None,
        status: None,
        status_token: 0,
    })
}

fn list_endpoint(view: &ViewData) -> String {
    view.filter
        .as_ref()
        .map_or_else(|| view.kind.endpoint(), FkFilter::endpoint)
}

fn refresh<R: AppRuntime + ?Sized>(runtime: &mut R, view: &mut ViewData) -> Result<()> {
    let endpoint = list_endpoint(view);
    refresh_table(runtime, &endpoint, &view.columns, &mut view.table)?;
    clamp_selection(view);
    Ok(())
}

fn clamp_selection(view: &mut ViewData) {
    view.selected_row = view
        .selected_row
        .min(view.table.rows.len().saturating_sub(1));
}

fn process_internal_events<R: AppRuntime + ?Sized>(
    runtime: &mut R,
    view: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view.status_token => {
                view.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::SyncCompleted { request, outcome } => {
                handle_sync_completed(runtime, view, tx, &request, &outcome);
            }
        }
    }
}

fn handle_sync_completed<R: AppRuntime + ?Sized>(
    runtime: &mut R,
    view: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request: &SyncRequest,
    outcome: &SyncOutcome,
) {
    tracing::info!(
        method = request.op().method(),
        path = %request.path(),
        ?outcome,
        "sync finished"
    );
    let feedback = outcome.feedback();

    // The user may have switched tabs while the request was in flight.
    if request.endpoint().trim_end_matches('/') != view.kind.endpoint() {
        emit_status(view, tx, feedback);
        return;
    }

    view.table.settle(request, outcome);
    if outcome.is_applied() {
        if let Err(error) = refresh(runtime, view) {
            view.table
                .settle(request, &SyncOutcome::unreachable(request.op()));
            view.alert = Some(format!("refresh failed: {error:#}"));
        }
    } else {
        view.alert = Some(feedback.message.clone());
    }
    emit_status(view, tx, feedback);
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(FEEDBACK_WINDOW);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(view: &mut ViewData, internal_tx: &Sender<InternalEvent>, feedback: Feedback) {
    view.status = Some(feedback);
    view.status_token = view.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view.status_token);
}

/// Returns true when the app should quit.
fn handle_key_event<R: AppRuntime + ?Sized>(
    runtime: &mut R,
    view: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    if view.alert.take().is_some() {
        return false;
    }
    if let Some(id) = view.confirm_delete.take() {
        if matches!(key.code, KeyCode::Char('y' | 'Y')) {
            dispatch(runtime, view, internal_tx, EditCommand::ConfirmDelete { id });
        }
        return false;
    }
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if is_editing(view) {
        handle_edit_key(runtime, view, internal_tx, key);
        return false;
    }
    handle_nav_key(runtime, view, internal_tx, key)
}

fn is_editing(view: &ViewData) -> bool {
    match view.focus {
        Focus::Footer => true,
        Focus::Row => view
            .table
            .rows
            .get(view.selected_row)
            .is_some_and(|row| row.mode == RowMode::Edit),
    }
}

fn handle_nav_key<R: AppRuntime + ?Sized>(
    runtime: &mut R,
    view: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => move_row(view, 1),
        KeyCode::Char('k') | KeyCode::Up => move_row(view, -1),
        KeyCode::Char('f') => switch_tab(runtime, view, 1),
        KeyCode::Char('b') => switch_tab(runtime, view, -1),
        KeyCode::Char('e') => {
            let row = view.selected_row;
            dispatch(runtime, view, internal_tx, EditCommand::Edit(row));
        }
        KeyCode::Char('d') => {
            let row = view.selected_row;
            dispatch(runtime, view, internal_tx, EditCommand::Delete(row));
        }
        KeyCode::Char('a') => {
            view.focus = Focus::Footer;
            view.selected_cell = first_editable_cell(&view.columns);
        }
        KeyCode::Char('[') => cycle_filter(runtime, view, -1),
        KeyCode::Char(']') => cycle_filter(runtime, view, 1),
        KeyCode::Char('r') => {
            if let Err(error) = refresh(runtime, view) {
                view.alert = Some(format!("refresh failed: {error:#}"));
            }
        }
        _ => {}
    }
    false
}

fn handle_edit_key<R: AppRuntime + ?Sized>(
    runtime: &mut R,
    view: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let width = view.columns.len().max(1);
    let row = view.selected_row;
    match key.code {
        KeyCode::Esc => match view.focus {
            Focus::Footer => view.focus = Focus::Row,
            Focus::Row => dispatch(runtime, view, internal_tx, EditCommand::Cancel(row)),
        },
        KeyCode::Enter => {
            let command = match view.focus {
                Focus::Footer => EditCommand::Add,
                Focus::Row => EditCommand::Save(row),
            };
            dispatch(runtime, view, internal_tx, command);
        }
        KeyCode::Left | KeyCode::BackTab => {
            view.selected_cell = (view.selected_cell + width - 1) % width;
        }
        KeyCode::Right | KeyCode::Tab => view.selected_cell = (view.selected_cell + 1) % width,
        KeyCode::Up => {
            if let Some(editor) = focused_editor(view) {
                editor.cycle(-1);
            }
        }
        KeyCode::Down => {
            if let Some(editor) = focused_editor(view) {
                editor.cycle(1);
            }
        }
        KeyCode::Backspace => {
            if let Some(editor) = focused_editor(view) {
                editor.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(editor) = focused_editor(view) {
                editor.push(ch);
            }
        }
        _ => {}
    }
}

/// Editor under the cursor, unless its row is waiting on the server.
fn focused_editor(view: &mut ViewData) -> Option<&mut Editor> {
    let index = view.selected_cell;
    match view.focus {
        Focus::Footer => {
            if view.table.footer.pending {
                return None;
            }
            view.table.footer.editors.get_mut(index)
        }
        Focus::Row => view
            .table
            .rows
            .get_mut(view.selected_row)
            .filter(|row| !row.pending && row.mode == RowMode::Edit)
            .and_then(|row| row.cells.get_mut(index))
            .map(|cell| &mut cell.editor),
    }
}

fn dispatch<R: AppRuntime + ?Sized>(
    runtime: &mut R,
    view: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: EditCommand,
) {
    let endpoint = view.kind.endpoint();
    let effects = view.table.dispatch(&endpoint, &view.columns, command);
    for effect in effects {
        match effect {
            EditEffect::ModeChanged { row, mode } => {
                tracing::debug!(row, ?mode, "row mode changed");
                if mode == RowMode::Edit {
                    view.selected_row = row;
                    view.selected_cell = first_editable_cell(&view.columns);
                }
            }
            EditEffect::Invalid { error, .. } => {
                view.alert = Some(format!("Invalid record: {error}"));
            }
            EditEffect::ConfirmationRequested { id } => view.confirm_delete = Some(id),
            EditEffect::Sync(request) => {
                tracing::info!(
                    method = request.op().method(),
                    path = %request.path(),
                    "sending sync request"
                );
                if let Err(error) = runtime.spawn_sync(request.clone(), internal_tx.clone()) {
                    let outcome = SyncOutcome::unreachable(request.op());
                    view.table.settle(&request, &outcome);
                    view.alert = Some(format!("{}: {error:#}", outcome.feedback().message));
                }
            }
        }
    }
}

fn first_editable_cell(columns: &ColumnSet) -> usize {
    columns
        .iter()
        .position(|column| !column.autoinc)
        .unwrap_or(0)
}

fn move_row(view: &mut ViewData, delta: isize) {
    let last = view.table.rows.len().saturating_sub(1);
    view.selected_row = view.selected_row.saturating_add_signed(delta).min(last);
}

fn switch_tab<R: AppRuntime + ?Sized>(runtime: &mut R, view: &mut ViewData, delta: isize) {
    let tabs = ResourceKind::ALL;
    let current = tabs.iter().position(|kind| *kind == view.kind).unwrap_or(0);
    let next = tabs[(current as isize + delta).rem_euclid(tabs.len() as isize) as usize];
    match load_view(runtime, next) {
        Ok(mut loaded) => {
            loaded.status = view.status.take();
            loaded.status_token = view.status_token;
            *view = loaded;
        }
        Err(error) => view.alert = Some(format!("cannot open {}: {error:#}", next.label())),
    }
}

fn cycle_filter<R: AppRuntime + ?Sized>(runtime: &mut R, view: &mut ViewData, delta: isize) {
    let Some(filter) = view.filter.as_mut() else {
        return;
    };
    let options = filter.dropdown().options().len();
    if options == 0 {
        return;
    }
    let current = filter.dropdown().selected().unwrap_or(0);
    let next = (current as isize + delta).rem_euclid(options as isize) as usize;
    match filter.on_change(next, runtime, &view.columns, &mut view.table) {
        Ok(()) => {
            view.selected_row = 0;
        }
        Err(error) => {
            filter.select(current);
            view.alert = Some(format!("filter failed: {error:#}"));
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, view: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = ResourceKind::ALL
        .iter()
        .position(|kind| *kind == view.kind)
        .unwrap_or(0);
    let tabs = Tabs::new(ResourceKind::ALL.iter().map(|kind| kind.label()))
        .block(Block::default().title("staffdesk").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    render_table_widget(frame, layout[1], view);

    let status_style = match view.status.as_ref().map(|feedback| feedback.kind) {
        Some(FeedbackKind::Success) => Style::default().fg(Color::Green),
        Some(FeedbackKind::Error) => Style::default().fg(Color::Red),
        None => Style::default().fg(Color::Yellow),
    };
    let status = Paragraph::new(status_text(view))
        .style(status_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let Some(id) = &view.confirm_delete {
        let area = centered_rect(50, 25, frame.area());
        frame.render_widget(Clear, area);
        let confirm = Paragraph::new(format!(
            "Delete {} record {id}?\n\ny deletes, any other key keeps it",
            view.kind.label()
        ))
        .block(Block::default().title("confirm").borders(Borders::ALL));
        frame.render_widget(confirm, area);
    }

    if let Some(message) = &view.alert {
        let area = centered_rect(60, 25, frame.area());
        frame.render_widget(Clear, area);
        let alert = Paragraph::new(format!("{message}\n\npress any key"))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().title("alert").borders(Borders::ALL));
        frame.render_widget(alert, area);
    }
}

fn render_table_widget(frame: &mut ratatui::Frame<'_>, area: Rect, view: &ViewData) {
    let table = &view.table;
    let widths = vec![Constraint::Min(6); table.header.len().max(1)];
    let editing = is_editing(view);

    let header = Row::new(table.header.iter().map(|label| {
        Cell::from(label.clone()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let mut rows = Vec::with_capacity(table.body_len() + 1);
    if table.has_placeholder_row() {
        rows.push(Row::new(vec![Cell::from(String::new()); table.header.len()]));
    }
    for (row_index, row) in table.rows.iter().enumerate() {
        let selected_row = view.focus == Focus::Row && row_index == view.selected_row;
        let mut row_style = Style::default();
        if row.pending {
            row_style = row_style.fg(Color::DarkGray);
        }
        if selected_row {
            row_style = row_style.bg(Color::DarkGray);
        }

        let cells = row
            .cells
            .iter()
            .enumerate()
            .map(|(column_index, cell)| {
                let text = match row.mode {
                    RowMode::View => cell.display.clone(),
                    RowMode::Edit => cell.editor.text(),
                };
                let style = if selected_row && editing && column_index == view.selected_cell {
                    focused_cell_style()
                } else {
                    row_style
                };
                Cell::from(text).style(style)
            })
            .chain(
                row.actions()
                    .into_iter()
                    .map(|action| Cell::from(action.label()).style(row_style)),
            )
            .collect::<Vec<_>>();
        rows.push(Row::new(cells));
    }

    let footer_focused = view.focus == Focus::Footer;
    let footer_cells = table
        .footer
        .editors
        .iter()
        .enumerate()
        .map(|(column_index, editor)| {
            let (text, mut style) = footer_cell_text(editor);
            if footer_focused && column_index == view.selected_cell {
                style = focused_cell_style();
            }
            Cell::from(text).style(style)
        })
        .chain(table.footer.actions().into_iter().map(|action| {
            Cell::from(action.map(|action| action.label()).unwrap_or_default())
        }))
        .collect::<Vec<_>>();
    rows.push(Row::new(footer_cells));

    let title = match &view.filter {
        Some(filter) => format!("{} | filter: {}", view.kind.label(), filter.label()),
        None => view.kind.label().to_owned(),
    };
    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn footer_cell_text(editor: &Editor) -> (String, Style) {
    match editor {
        Editor::Input(input) if input.value().is_empty() => (
            input.placeholder.unwrap_or_default().to_owned(),
            Style::default().fg(Color::DarkGray),
        ),
        _ => (editor.text(), Style::default()),
    }
}

fn focused_cell_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn status_text(view: &ViewData) -> String {
    let (mode, hints) = if view.focus == Focus::Footer {
        ("ADD", "tab/arrows cell | type | up/down choose | enter add | esc back")
    } else if is_editing(view) {
        ("EDIT", "tab/arrows cell | type | up/down choose | enter save | esc cancel")
    } else {
        ("NAV", "j/k row | f/b table | e edit | d delete | a add | [/] filter | r | q")
    };
    match &view.status {
        Some(feedback) => format!("{mode} | {} | {hints}", feedback.message),
        None => format!("{mode} | {hints}"),
    }
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
