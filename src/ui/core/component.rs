use super::actions::Action;
use crossterm::event::{Event, KeyEvent};
use ratatui::{layout::Rect, Frame};

pub trait Component {
    fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn handle_events(&mut self, event: Option<Event>) -> Action {
        match event {
            Some(Event::Key(key)) => self.handle_key_events(key),
            Some(Event::Paste(text)) => self.handle_paste(&text),
            _ => Action::None,
        }
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Action;

    /// Bracketed paste. Ignored unless a component cares.
    fn handle_paste(&mut self, _text: &str) -> Action {
        Action::None
    }

    fn update(&mut self, action: Action) -> Action {
        // Default implementation passes action through
        action
    }

    fn render(&mut self, f: &mut Frame, rect: Rect);

    // Optional lifecycle methods
    fn on_focus(&mut self) {}
    fn on_blur(&mut self) {}
}
