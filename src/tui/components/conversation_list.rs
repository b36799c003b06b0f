//! # Conversation List Overlay
//!
//! Browse, open, rename and delete server conversations.
//! Opened with Ctrl+O, dismissed with Esc.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `ConversationListState` lives in `TuiState`
//! - `ConversationList` is created each frame with borrowed state and the
//!   store's current conversations, so refreshes show up while it is open

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::api::Conversation;
use crate::core::store::ConversationStore;
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    Open(String),
    New,
    Delete(String),
    Rename { id: String, title: String },
    Refresh,
    Dismiss,
}

pub struct ConversationListState {
    pub selected: usize,
    pub confirm_delete: bool,
    /// Title being edited for the selected conversation
    pub rename_buffer: Option<String>,
    pub list_state: ListState,
}

impl Default for ConversationListState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationListState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            confirm_delete: false,
            rename_buffer: None,
            list_state: ListState::default(),
        }
    }

    /// Start on the active conversation, if it is listed.
    pub fn opened_at(store: &ConversationStore) -> Self {
        let mut state = Self::new();
        if let Some(active) = store.active()
            && let Some(idx) = store.conversations().iter().position(|c| c.id == active)
        {
            state.selected = idx;
        }
        state
    }

    fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        self.list_state
            .select((len > 0).then_some(self.selected));
    }

    pub fn handle_event(
        &mut self,
        event: &TuiEvent,
        conversations: &[Conversation],
    ) -> Option<ConversationEvent> {
        self.clamp(conversations.len());

        if let Some(buffer) = self.rename_buffer.as_mut() {
            match event {
                TuiEvent::InputChar(c) => buffer.push(*c),
                TuiEvent::Paste(text) => buffer.push_str(text),
                TuiEvent::Backspace => {
                    buffer.pop();
                }
                TuiEvent::Escape => self.rename_buffer = None,
                TuiEvent::Submit => {
                    let title = buffer.trim().to_string();
                    self.rename_buffer = None;
                    if title.is_empty() {
                        return None;
                    }
                    return conversations.get(self.selected).map(|c| ConversationEvent::Rename {
                        id: c.id.clone(),
                        title,
                    });
                }
                _ => {}
            }
            return None;
        }

        let is_delete_key = matches!(event, TuiEvent::InputChar('d'));
        if !is_delete_key {
            self.confirm_delete = false;
        }

        match event {
            TuiEvent::Escape => Some(ConversationEvent::Dismiss),
            TuiEvent::CursorUp => {
                self.selected = self.selected.saturating_sub(1);
                self.clamp(conversations.len());
                None
            }
            TuiEvent::CursorDown => {
                self.selected += 1;
                self.clamp(conversations.len());
                None
            }
            TuiEvent::Submit => conversations
                .get(self.selected)
                .map(|c| ConversationEvent::Open(c.id.clone())),
            TuiEvent::InputChar('n') => Some(ConversationEvent::New),
            TuiEvent::InputChar('g') | TuiEvent::RefreshConversations => {
                Some(ConversationEvent::Refresh)
            }
            TuiEvent::InputChar('r') => {
                self.rename_buffer = conversations.get(self.selected).map(|c| c.title.clone());
                None
            }
            TuiEvent::InputChar('d') => {
                let conversation = conversations.get(self.selected)?;
                if self.confirm_delete {
                    self.confirm_delete = false;
                    Some(ConversationEvent::Delete(conversation.id.clone()))
                } else {
                    self.confirm_delete = true;
                    None
                }
            }
            _ => None,
        }
    }
}

pub struct ConversationList<'a> {
    state: &'a mut ConversationListState,
    store: &'a ConversationStore,
}

impl<'a> ConversationList<'a> {
    pub fn new(state: &'a mut ConversationListState, store: &'a ConversationStore) -> Self {
        Self { state, store }
    }

    fn help_text(&self) -> String {
        if let Some(buffer) = &self.state.rename_buffer {
            format!(" Rename: {buffer}▏ Enter Save  Esc Cancel ")
        } else if self.state.confirm_delete {
            " Press d again to confirm delete | Esc Cancel ".to_string()
        } else {
            " n New  r Rename  d Delete  g Refresh  Enter Open  Esc Back ".to_string()
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let conversations = self.store.conversations();
        self.state.clamp(conversations.len());

        let overlay = centered_rect(80, 70, area);
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Conversations ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(self.help_text()).centered())
            .padding(Padding::horizontal(1));

        if conversations.is_empty() {
            let empty = Paragraph::new("No conversations yet.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let inner_width = overlay.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = conversations
            .iter()
            .enumerate()
            .map(|(i, conversation)| {
                let date = format_date(conversation);
                let count = conversation
                    .message_count
                    .map(|n| format!("{n} msgs"))
                    .unwrap_or_default();
                let marker = if self.store.is_active(&conversation.id) {
                    "● "
                } else {
                    "  "
                };

                let fixed_width = 2 + date.chars().count() + 2 + count.chars().count() + 2;
                let title_width = inner_width.saturating_sub(fixed_width);
                let title = truncate_str(&conversation.title, title_width);
                let padded_title = format!("{title:<title_width$}");

                let style = if i == self.state.selected {
                    let fg = if self.state.confirm_delete {
                        Color::Red
                    } else {
                        Color::White
                    };
                    Style::default()
                        .fg(fg)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(date, style),
                    Span::styled("  ", style),
                    Span::styled(padded_title, style),
                    Span::styled("  ", style),
                    Span::styled(count, style),
                ]))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}

/// "Jan 15" in local time, blank when the server sent no timestamp.
fn format_date(conversation: &Conversation) -> String {
    conversation
        .updated_at
        .or(conversation.created_at)
        .map(|ts| ts.with_timezone(&chrono::Local).format("%b %d").to_string())
        .unwrap_or_else(|| " ".repeat(6))
}

/// Truncate to `max_width` chars, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        ".".repeat(max_width)
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}

/// A rect covering the given percentages of `outer`, centered.
pub fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn conversations() -> Vec<Conversation> {
        vec![Conversation::new("a", "Cats"), Conversation::new("b", "Dogs")]
    }

    #[test]
    fn test_navigation_and_open() {
        let list = conversations();
        let mut state = ConversationListState::new();
        state.handle_event(&TuiEvent::CursorDown, &list);
        state.handle_event(&TuiEvent::CursorDown, &list);
        assert_eq!(state.selected, 1);
        assert_eq!(
            state.handle_event(&TuiEvent::Submit, &list),
            Some(ConversationEvent::Open("b".into()))
        );
        state.handle_event(&TuiEvent::CursorUp, &list);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let list = conversations();
        let mut state = ConversationListState::new();
        assert_eq!(state.handle_event(&TuiEvent::InputChar('d'), &list), None);
        assert!(state.confirm_delete);
        assert_eq!(
            state.handle_event(&TuiEvent::InputChar('d'), &list),
            Some(ConversationEvent::Delete("a".into()))
        );

        state.handle_event(&TuiEvent::InputChar('d'), &list);
        state.handle_event(&TuiEvent::CursorDown, &list);
        assert!(!state.confirm_delete);
    }

    #[test]
    fn test_rename_edits_current_title() {
        let list = conversations();
        let mut state = ConversationListState::new();
        state.handle_event(&TuiEvent::InputChar('r'), &list);
        assert_eq!(state.rename_buffer.as_deref(), Some("Cats"));
        // Keys go to the buffer while renaming
        assert_eq!(state.handle_event(&TuiEvent::InputChar('!'), &list), None);
        assert_eq!(
            state.handle_event(&TuiEvent::Submit, &list),
            Some(ConversationEvent::Rename {
                id: "a".into(),
                title: "Cats!".into()
            })
        );
        assert!(state.rename_buffer.is_none());
    }

    #[test]
    fn test_blank_rename_is_dropped() {
        let list = conversations();
        let mut state = ConversationListState::new();
        state.rename_buffer = Some("   ".into());
        assert_eq!(state.handle_event(&TuiEvent::Submit, &list), None);
    }

    #[test]
    fn test_empty_list() {
        let mut state = ConversationListState::new();
        assert_eq!(state.handle_event(&TuiEvent::Submit, &[]), None);
        assert_eq!(state.handle_event(&TuiEvent::InputChar('d'), &[]), None);
        assert_eq!(
            state.handle_event(&TuiEvent::InputChar('n'), &[]),
            Some(ConversationEvent::New)
        );
    }

    #[test]
    fn test_opened_at_active() {
        let mut store = ConversationStore::new();
        store.replace(conversations());
        store.set_active("b");
        assert_eq!(ConversationListState::opened_at(&store).selected, 1);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_str("héllo wörld", 8), "héllo...");
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("abcdef", 2), "..");
    }

    #[test]
    fn test_render_lists_titles() {
        let mut store = ConversationStore::new();
        store.replace(conversations());
        let mut state = ConversationListState::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| ConversationList::new(&mut state, &store).render(f, f.area()))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Conversations"));
        assert!(text.contains("Cats"));
        assert!(text.contains("Dogs"));
    }
}
