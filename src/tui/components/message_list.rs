//! # MessageList Component
//!
//! Scrollable view of the transcript.
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the rendered entries
//! (props). Since `Component::render` takes `&mut self`, the layout cache and
//! scroll state are updated during the render pass.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::render::Node;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::{MessageView, media_items};
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Lives in the parent `TuiState`.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Selected entry (hover or keyboard navigation)
    pub selected_index: Option<usize>,
    /// Media item within the selected entry that media keys act on
    pub focused_media: usize,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Set during render when content extends below the viewport
    pub has_unseen_content: bool,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            selected_index: None,
            focused_media: 0,
            viewport_height: 0,
            has_unseen_content: false,
        }
    }

    pub fn select(&mut self, index: Option<usize>) {
        if self.selected_index != index {
            self.focused_media = 0;
        }
        self.selected_index = index;
    }

    /// Move media focus to the next item of the selected entry, wrapping.
    pub fn focus_next_media(&mut self, media_count: usize) {
        if media_count > 0 {
            self.focused_media = (self.focused_media + 1) % media_count;
        }
    }

    fn max_scroll(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Scroll so the selected entry is fully visible.
    /// Entries taller than the viewport are aligned by their top edge.
    pub fn scroll_to_selected(&mut self) {
        let Some(idx) = self.selected_index else {
            return;
        };
        if idx >= self.layout.prefix_heights.len() {
            return;
        }

        let item_top = if idx == 0 {
            0
        } else {
            self.layout.prefix_heights[idx - 1]
        };
        let item_bottom = self.layout.prefix_heights[idx];
        let offset_y = self.scroll_state.offset().y;

        if item_top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: item_top });
            self.stick_to_bottom = false;
        } else if item_bottom > offset_y + self.viewport_height {
            let new_y = item_bottom.saturating_sub(self.viewport_height);
            self.scroll_state.set_offset(Position { x: 0, y: new_y });
            self.stick_to_bottom = new_y >= self.max_scroll();
        }
    }

    /// Re-engage auto-scroll once the user has scrolled to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Entry index under a content-space row.
    pub fn entry_at(&self, content_y: u16) -> Option<usize> {
        let idx = self.layout.prefix_heights.partition_point(|&end| end <= content_y);
        (idx < self.layout.prefix_heights.len()).then_some(idx)
    }
}

/// Scrollable transcript component.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub entries: &'a [Node],
    pub is_loading: bool,
    pub pulse_value: f32,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        entries: &'a [Node],
        is_loading: bool,
        pulse_value: f32,
    ) -> Self {
        Self {
            state,
            entries,
            is_loading,
            pulse_value,
        }
    }
}

fn is_placeholder(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| e.has_class("typing") || e.has_class("regenerating"))
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // scrollbar
        self.state.layout.update(self.entries, content_width);

        let total_height = self.state.layout.total_height();

        self.state.viewport_height = area.height;
        if let Some(idx) = self.state.selected_index
            && idx >= self.entries.len()
        {
            self.state.select(None);
        }
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let node = &self.entries[i];
            let height = self.state.layout.heights[i];
            let is_selected = self.state.selected_index == Some(i);

            let mut view = MessageView::new(node, is_selected);
            if is_selected && !media_items(node).is_empty() {
                view.focused_media = Some(self.state.focused_media);
            }
            if self.is_loading && is_placeholder(node) {
                view.pulse_intensity = self.pulse_value;
            }

            scroll_view.render_widget(view, Rect::new(0, y_offset, content_width, height));
            y_offset = y_offset.saturating_add(height);
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);

        let current_offset = self.state.scroll_state.offset().y;
        self.state.has_unseen_content =
            total_height > area.height && current_offset < total_height - area.height;
    }
}

/// Scroll handling lives on the persistent state; `MessageList` is rebuilt
/// every frame.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached entry heights.
///
/// Entries are compared by value against the previous frame's render trees;
/// only the heights from the first differing entry onward are recomputed.
/// Regeneration can replace an entry mid-transcript, so a plain count check
/// is not enough.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    entries: Vec<Node>,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            entries: Vec::new(),
            content_width: 0,
        }
    }

    pub fn reusable_count(&self, entries: &[Node], content_width: u16) -> usize {
        if self.content_width != content_width {
            return 0;
        }
        self.entries
            .iter()
            .zip(entries)
            .take_while(|(cached, fresh)| cached == fresh)
            .count()
            .min(self.heights.len())
    }

    pub fn update(&mut self, entries: &[Node], content_width: u16) {
        let reusable = self.reusable_count(entries, content_width);
        if reusable == entries.len() && reusable == self.heights.len() {
            return;
        }
        self.heights.truncate(reusable);
        for node in &entries[reusable..] {
            self.heights
                .push(MessageView::calculate_height(node, content_width));
        }
        self.entries = entries.to_vec();
        self.content_width = content_width;
        self.rebuild_prefix_heights();
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    /// Content height, capped at what the scroll view can address.
    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
