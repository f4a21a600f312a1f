use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::registration::NoticeLevel;

/// Creates a styled main dialog block
pub fn create_dialog_block<'a>(title: &'a str, theme_color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {} ", title))
        .title_style(Style::default().fg(theme_color).add_modifier(Modifier::BOLD))
        .style(Style::default().fg(theme_color))
}

/// Creates an input field block; the focused field shows a cursor and a brighter border.
/// Secret fields render one `•` per character.
pub fn create_input_paragraph<'a>(value: &str, field_title: &str, focused: bool, secret: bool) -> Paragraph<'a> {
    let shown = if secret {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let display = if focused { format!("{}█", shown) } else { shown };

    Paragraph::new(display)
        .block(field_block(field_title, focused))
        .style(Style::default().fg(Color::White))
}

/// Creates a selection field block (read-only value, changed with Space or arrows)
pub fn create_selection_paragraph<'a>(value: String, field_title: &str, focused: bool) -> Paragraph<'a> {
    let display = if focused { format!("◀ {} ▶", value) } else { value };
    Paragraph::new(display)
        .block(field_block(field_title, focused))
        .style(Style::default().fg(Color::White))
}

/// A one-line push button
pub fn create_button<'a>(label: &str, focused: bool, enabled: bool) -> Paragraph<'a> {
    let style = match (focused, enabled) {
        (_, false) => Style::default().fg(Color::DarkGray),
        (true, true) => Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        (false, true) => Style::default().fg(Color::Cyan),
    };
    Paragraph::new(format!("[ {} ]", label))
        .style(style)
        .alignment(Alignment::Center)
}

fn field_block<'a>(field_title: &str, focused: bool) -> Block<'a> {
    let border = if focused { Color::Cyan } else { Color::Gray };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {} ", field_title))
        .title_style(Style::default().fg(Color::White))
        .style(Style::default().fg(border))
}

pub fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    }
}

/// Instruction shortcut definition: (key, color, description)
pub type InstructionShortcut = (&'static str, Color, &'static str);

/// Creates a paragraph with color-coded instruction shortcuts
pub fn create_instructions_paragraph<'a>(instructions: &[InstructionShortcut]) -> Paragraph<'a> {
    let mut instruction_text = Vec::new();
    for (key, color, desc) in instructions {
        instruction_text.push(Span::styled(
            *key,
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        ));
        instruction_text.push(Span::styled(*desc, Style::default().fg(Color::Gray)));
    }

    Paragraph::new(Line::from(instruction_text)).alignment(Alignment::Center)
}

/// Common instruction shortcuts used across dialogs
pub mod shortcuts {
    use super::*;

    pub const SEPARATOR: InstructionShortcut = (" • ", Color::Gray, "");
    pub const ESC_CANCEL: InstructionShortcut = ("Esc", Color::Red, " Cancel");
    pub const ESC_CLOSE: InstructionShortcut = ("Esc", Color::Red, " Close");
    pub const TAB_NEXT: InstructionShortcut = ("Tab", Color::Cyan, " Next field");
    pub const ENTER_SUBMIT: InstructionShortcut = ("Enter", Color::Green, " Submit");
    pub const SPACE_CHANGE: InstructionShortcut = ("Space/←→", Color::Yellow, " Change");
}
