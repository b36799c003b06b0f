//! # Welcome Component
//!
//! Shown in the conversation pane when no conversation is open. The heading
//! and blurb come from the welcome render tree so every front end greets the
//! same way.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::render::{Node, Tag, render_welcome};
use crate::tui::component::Component;

pub struct Welcome {
    pub dictation_available: bool,
}

impl Welcome {
    pub fn new(dictation_available: bool) -> Self {
        Self {
            dictation_available,
        }
    }

    fn key_hints(&self) -> Vec<(&'static str, &'static str)> {
        let mut hints = vec![
            ("Enter", "send"),
            ("Ctrl+R", "cycle mode"),
            ("Ctrl+O", "conversations"),
            ("Ctrl+N", "new chat"),
            ("/attach <path>", "add an image"),
        ];
        if self.dictation_available {
            hints.push(("Ctrl+D", "dictate"));
        }
        hints
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let welcome = render_welcome();
        let text_of = |tag: Tag| {
            welcome
                .find_all(&|e| e.tag == tag)
                .first()
                .map(|e| Node::Element((*e).clone()).text_content())
                .unwrap_or_default()
        };

        let mut lines = vec![
            Line::from(Span::styled(
                text_of(Tag::H1),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("v{}", env!("CARGO_PKG_VERSION")),
                Style::default().fg(Color::DarkGray),
            )),
            Line::default(),
            Line::from(text_of(Tag::P)),
            Line::default(),
        ];
        for (key, action) in self.key_hints() {
            lines.push(Line::from(vec![
                Span::styled(key, Style::default().fg(Color::Cyan)),
                Span::styled(format!("  {action}"), Style::default().fg(Color::DarkGray)),
            ]));
        }
        lines
    }
}

impl Component for Welcome {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = self.lines();
        let [centered] = Layout::vertical([Constraint::Length(lines.len() as u16)])
            .flex(Flex::Center)
            .areas(area);
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, centered);
    }
}
