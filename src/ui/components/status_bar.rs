//! Status bar component: a toast when there is one, key hints otherwise

use std::time::{Duration, Instant};

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph},
    Frame,
};

use super::common::notice_color;
use crate::registration::Notice;

const KEY_HINTS: &str = "j/k: move • space: toggle • d: delete • R: regenerate • c: create • a: scope • t: refresh • n: register • e: endpoints • G: logs • q: quit";

pub struct StatusBar {
    notice: Option<(Notice, Instant)>,
    ttl: Duration,
}

impl StatusBar {
    pub fn new(ttl: Duration) -> Self {
        Self { notice: None, ttl }
    }

    pub fn show(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }

    pub fn current(&self) -> Option<&Notice> {
        self.notice.as_ref().map(|(notice, _)| notice)
    }

    /// Drop the toast once it has been up long enough. Returns whether it changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.notice {
            Some((_, shown_at)) if now.duration_since(*shown_at) >= self.ttl => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, busy: bool) {
        let (text, color) = match &self.notice {
            Some((notice, _)) => (notice.message.clone(), notice_color(notice.level)),
            None if busy => ("🔄 Working...".to_string(), Color::Yellow),
            None => (KEY_HINTS.to_string(), Color::Gray),
        };

        let status_bar = Paragraph::new(text)
            .block(Block::default())
            .alignment(Alignment::Center)
            .style(Style::default().fg(color));

        f.render_widget(status_bar, area);
    }
}
