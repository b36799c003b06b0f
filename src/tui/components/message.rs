use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::render::{Command, Element, Node, Tag};
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Borders (1 left + 1 right) plus padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

const PULSE_BOLD_THRESHOLD: f32 = 0.6;
const PULSE_NORMAL_THRESHOLD: f32 = 0.2;

/// Draws one rendered transcript entry (see [`crate::render::render_entry`]).
///
/// `MessageView` is a transient component: the parent builds it each frame
/// from the entry's render tree and its own selection state. Formatting comes
/// from the tree itself: `strong` is bold, `em` is italic, `br` breaks the line.
/// Media items become one line each, and the entry's commands are offered as
/// key hints on the bottom border while it is selected.
#[derive(Clone, Copy)]
pub struct MessageView<'a> {
    pub node: &'a Node,
    pub is_selected: bool,
    /// Index into [`media_items`] highlighted for media commands
    pub focused_media: Option<usize>,
    pub pulse_intensity: f32,
}

impl<'a> MessageView<'a> {
    pub fn new(node: &'a Node, is_selected: bool) -> Self {
        Self {
            node,
            is_selected,
            focused_media: None,
            pulse_intensity: 0.0,
        }
    }

    /// Height of the entry at `width`, borders included.
    ///
    /// Uses the same paragraph the widget renders, so the list's layout
    /// cache and the drawn output never disagree.
    pub fn calculate_height(node: &Node, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = body_lines(node, Style::default(), None);
        let rows = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .line_count(content_width);
        (rows as u16).max(1) + VERTICAL_OVERHEAD
    }
}

/// Media item elements in document order.
pub fn media_items(node: &Node) -> Vec<&Element> {
    node.find_all(&|e| e.has_class("media-item"))
}

fn media_url(item: &Element) -> Option<&str> {
    item.children
        .iter()
        .filter_map(Node::as_element)
        .find(|e| matches!(e.tag, Tag::Img | Tag::Video))
        .and_then(|e| e.get_attr("src"))
}

fn media_title(item: &Element) -> String {
    item.children
        .iter()
        .filter_map(Node::as_element)
        .find(|e| e.has_class("media-title"))
        .map(|e| Node::Element(e.clone()).text_content())
        .unwrap_or_default()
}

/// The command bound to `key` for this entry. Media keys act on the media
/// item at `focused_media`.
pub fn command_for_key(node: &Node, focused_media: usize, key: char) -> Option<Command> {
    let wanted = match key {
        's' => "select-refinement",
        'v' => "open-lightbox",
        'd' => "download",
        'r' => "regenerate",
        'y' => "copy",
        'u' => "restore",
        _ => return None,
    };
    let scope = match wanted {
        "select-refinement" | "open-lightbox" | "download" => {
            Node::Element(media_items(node).get(focused_media).copied()?.clone())
        }
        _ => Node::Element(node.find_class("message-actions")?.clone()),
    };
    scope
        .commands()
        .into_iter()
        .find(|c| c.name() == wanted)
        .cloned()
}

fn hint_for(command: &Command) -> &'static str {
    match command {
        Command::SelectRefinement(_) => "s refine",
        Command::OpenLightbox { .. } => "v view",
        Command::Download(_) => "d download",
        Command::Regenerate(_) => "r regenerate",
        Command::Copy(_) => "y copy",
        Command::Restore(_) => "u restore",
        Command::SelectConversation(_) | Command::DeleteConversation(_) | Command::NewChat => "",
    }
}

fn hints(node: &Node) -> String {
    let mut hints: Vec<&str> = Vec::new();
    if media_items(node).len() > 1 {
        hints.push("Tab next");
    }
    for command in node.commands() {
        let hint = hint_for(command);
        if !hint.is_empty() && !hints.contains(&hint) {
            hints.push(hint);
        }
    }
    hints.join("  ")
}

fn push_inline(node: &Node, style: Style, lines: &mut Vec<Line<'static>>) {
    match node {
        Node::Text(text) => {
            if let Some(line) = lines.last_mut() {
                line.push_span(Span::styled(text.clone(), style));
            }
        }
        Node::Element(element) => {
            let style = match element.tag {
                Tag::Br => {
                    lines.push(Line::default());
                    return;
                }
                Tag::Strong => style.add_modifier(Modifier::BOLD),
                Tag::Em => style.add_modifier(Modifier::ITALIC),
                _ => style,
            };
            for child in &element.children {
                push_inline(child, style, lines);
            }
        }
    }
}

fn media_line(item: &Element, focused: bool) -> Line<'static> {
    let url = media_url(item).unwrap_or_default().to_string();
    let marker = if item.has_class("video") {
        "▶"
    } else if item.has_class("selected") {
        "✓"
    } else {
        "▣"
    };
    let title = media_title(item);
    let mut spans = vec![Span::styled(
        format!("{marker} "),
        Style::default().fg(Color::Magenta),
    )];
    if !title.is_empty() {
        spans.push(Span::styled(
            format!("{title} "),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(url, Style::default().fg(Color::DarkGray)));

    let line = Line::from(spans);
    if focused {
        line.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        line
    }
}

fn body_lines(node: &Node, style: Style, focused_media: Option<usize>) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default()];
    if let Some(content) = node.find_class("message-content") {
        for child in &content.children {
            push_inline(child, style, &mut lines);
        }
    }
    for (i, item) in media_items(node).into_iter().enumerate() {
        lines.push(media_line(item, focused_media == Some(i)));
    }
    lines
}

fn classes_of(node: &Node) -> &[String] {
    node.as_element().map(|e| e.classes.as_slice()).unwrap_or(&[])
}

fn entry_style(node: &Node) -> Style {
    let has = |class: &str| classes_of(node).iter().any(|c| c == class);
    if has("error") {
        Style::default().fg(Color::Red)
    } else if has("typing") || has("regenerating") {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    } else if has("user") {
        Style::default().fg(Color::Green)
    } else if has("system") {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Blue)
    }
}

fn entry_label(node: &Node) -> &'static str {
    let classes = classes_of(node);
    if classes.iter().any(|c| c == "user") {
        "you"
    } else if classes.iter().any(|c| c == "system") {
        "system"
    } else {
        "vizzy"
    }
}

impl<'a> Widget for MessageView<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = entry_style(self.node);

        let mut border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            style.add_modifier(Modifier::DIM)
        };
        if self.pulse_intensity > PULSE_BOLD_THRESHOLD {
            border_style = border_style
                .remove_modifier(Modifier::DIM)
                .add_modifier(Modifier::BOLD);
        } else if self.pulse_intensity > PULSE_NORMAL_THRESHOLD {
            border_style = border_style.remove_modifier(Modifier::DIM);
        }

        let mut block = Block::bordered()
            .title(entry_label(self.node))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        if self.is_selected {
            let hints = hints(self.node);
            if !hints.is_empty() {
                block = block.title_bottom(Line::from(format!(" {hints} ")).right_aligned());
            }
        }

        let inner_area = block.inner(area);
        block.render(area, buf);

        let focused = if self.is_selected {
            self.focused_media
        } else {
            None
        };
        Paragraph::new(body_lines(self.node, Style::default(), focused))
            .style(style)
            .wrap(Wrap { trim: true })
            .render(inner_area, buf);
    }
}

impl<'a> Component for MessageView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
