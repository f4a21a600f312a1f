//! Terminal setup and the main event loop

use crate::api::ApiClient;
use crate::config::Config;
use crate::logger::Logger;
use crate::ui::app_component::AppComponent;
use crate::ui::core::{Component, EventHandler, EventType};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;

/// Run the TUI until the user quits
pub async fn run_app(config: Config, logger: Logger) -> anyhow::Result<()> {
    let api = ApiClient::from_config(&config.api)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = AppComponent::new(&config, api, logger.clone());
    let mut event_handler = EventHandler::new();
    app.start();

    let result = run_app_loop(&mut terminal, &mut app, &mut event_handler).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        logger.log(format!("Event loop stopped: {e}"));
    }
    result
}

async fn run_app_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppComponent,
    event_handler: &mut EventHandler,
) -> anyhow::Result<()> {
    let mut needs_render = true;

    loop {
        if needs_render {
            terminal.draw(|f| app.render(f, f.area()))?;
            needs_render = false;
        }

        let event = event_handler.next_event().await?;
        match event {
            EventType::Key(_) | EventType::Paste(_) | EventType::Resize(_, _) => {
                app.handle_event(event);
                needs_render = true;
            }
            EventType::Tick => {
                // Results from requests and cooldown ticks arrive here
                let background_actions = app.process_background_actions();
                if !background_actions.is_empty() {
                    needs_render = true;
                }
                for action in background_actions {
                    app.dispatch(action);
                }
                if app.on_tick() {
                    needs_render = true;
                }
            }
            EventType::Other => {}
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
