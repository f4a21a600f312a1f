use crossterm::event::{poll, Event, KeyEvent, KeyEventKind};
use tokio::time::Duration;

/// How long to wait for background work when the terminal is idle.
const IDLE_TICK: Duration = Duration::from_millis(100);

pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self { tick_rate: IDLE_TICK }
    }

    pub async fn next_event(&mut self) -> anyhow::Result<EventType> {
        // Check for terminal events without blocking first
        if poll(Duration::from_millis(0))? {
            return Ok(match crossterm::event::read()? {
                // Windows reports releases too; only presses drive the UI
                Event::Key(key) if key.kind == KeyEventKind::Press => EventType::Key(key),
                Event::Paste(text) => EventType::Paste(text),
                Event::Resize(w, h) => EventType::Resize(w, h),
                _ => EventType::Other,
            });
        }

        // If no immediate event, wait a bit and return tick
        tokio::time::sleep(self.tick_rate).await;
        Ok(EventType::Tick)
    }
}

#[derive(Debug, Clone)]
pub enum EventType {
    Key(KeyEvent),
    Paste(String),
    Resize(u16, u16),
    Tick,
    Other,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
