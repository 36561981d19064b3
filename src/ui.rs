// src/ui.rs

pub mod chat;
pub mod footer;
pub mod header;
pub mod suggestions;

use crate::{
    api::ModelService,
    app::App,
    conversation::{Conversation, ConversationView},
    errors::ConsejeroResult,
    key_handlers::{handle_key, UiAction},
};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::{io, time::Duration};
use tokio::sync::{mpsc, watch};

/// Requests from the terminal to the controller task.
#[derive(Debug)]
enum Command {
    Send(String),
    DismissError,
}

/// Runs the terminal UI. The controller moves into its own task, which
/// initializes it and then handles one command at a time.
pub async fn run_ui<S>(mut conversation: Conversation<S>) -> ConsejeroResult<()>
where
    S: ModelService + 'static,
    S::Session: 'static,
{
    let view_rx = conversation.subscribe();
    let (command_tx, mut command_rx) = mpsc::channel::<Command>(16);

    let worker = tokio::spawn(async move {
        conversation.initialize().await;
        while let Some(command) = command_rx.recv().await {
            match command {
                Command::Send(text) => {
                    conversation.send_message(&text).await;
                }
                Command::DismissError => conversation.dismiss_error(),
            }
        }
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, view_rx, command_tx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // No cancellation: quitting drops whatever send is in flight.
    worker.abort();
    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut view_rx: watch::Receiver<ConversationView>,
    command_tx: mpsc::Sender<Command>,
) -> ConsejeroResult<()> {
    let mut app = App::new(view_rx.borrow().clone());
    let tick_rate = Duration::from_millis(100);

    loop {
        if view_rx.has_changed().unwrap_or(false) {
            let view = view_rx.borrow_and_update().clone();
            app.apply_view(view);
        }

        if app.status_indicator.is_thinking() {
            app.status_indicator.update_spinner();
        }
        terminal.draw(|f| draw(f, &app))?;

        if !event::poll(tick_rate)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        let command = match handle_key(&mut app, key) {
            Some(UiAction::Quit) => return Ok(()),
            Some(UiAction::Send(text)) => Command::Send(text),
            Some(UiAction::DismissError) => Command::DismissError,
            None => continue,
        };
        if command_tx.send(command).await.is_err() {
            log::warn!("Controller task has stopped; closing UI");
            return Ok(());
        }
    }
}

fn draw(f: &mut Frame<'_>, app: &App) {
    let suggestions_height = if app.view.shows_suggestions() {
        suggestions::SUGGESTIONS_HEIGHT
    } else {
        0
    };
    let footer_height = if app.view.error.is_some() { 2 } else { 1 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(suggestions_height),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(footer_height),
        ])
        .split(f.area());

    header::draw_header(f, chunks[0]);
    chat::draw_messages(f, chunks[1], app);
    if suggestions_height > 0 {
        suggestions::draw_suggestions(f, chunks[2], app);
    }
    app.status_indicator.render(f, chunks[3]);
    chat::draw_input(f, chunks[4], app);
    footer::draw_footer(f, chunks[5], app);
}
