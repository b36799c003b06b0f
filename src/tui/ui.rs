use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::core::state::App;
use crate::render::{Node, render_view};
use crate::tui::component::Component;
use crate::tui::components::{ConversationList, LightboxView, MessageList, TitleBar, Welcome};
use crate::tui::{InputMode, TuiState};

/// Title, conversation pane and input box, top to bottom.
pub fn layout_areas(frame_area: Rect, input_height: u16) -> [Rect; 3] {
    use Constraint::{Length, Min};
    Layout::vertical([Length(1), Min(0), Length(input_height)]).areas(frame_area)
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let input_height = tui.input_box.calculate_height(frame.area().width);
    let [title_area, main_area, input_area] = layout_areas(frame.area(), input_height);

    match render_view(app) {
        Node::Element(view) if view.has_class("messages") => {
            MessageList::new(
                &mut tui.message_list,
                &view.children,
                app.is_loading(),
                tui.pulse_value,
            )
            .render(frame, main_area);
        }
        _ => {
            tui.message_list.has_unseen_content = false;
            Welcome::new(app.dictation_available).render(frame, main_area);
        }
    }

    let mut title_bar = TitleBar::new(app.title.clone(), app.status_message.clone());
    title_bar.is_loading = app.is_loading();
    title_bar.spinner_frame = spinner_frame;
    title_bar.has_unseen_content = tui.message_list.has_unseen_content;
    title_bar.render(frame, title_area);

    tui.input_box.dimmed = tui.input_mode == InputMode::Cursor
        || tui.conversation_list.is_some()
        || app.lightbox.is_some();
    tui.input_box.render(frame, input_area);

    if let Some(state) = tui.conversation_list.as_mut() {
        ConversationList::new(state, &app.store).render(frame, frame.area());
    } else if let Some(lightbox) = &app.lightbox {
        LightboxView::new(lightbox).render(frame, frame.area());
    }
}

/// Transcript entry under a screen row, if any.
pub fn hit_test_message(
    screen_y: u16,
    frame_area: Rect,
    input_height: u16,
    scroll_offset_y: u16,
    prefix_heights: &[u16],
) -> Option<usize> {
    let [_, main_area, _] = layout_areas(frame_area, input_height);
    if screen_y < main_area.y || screen_y >= main_area.y + main_area.height {
        return None;
    }
    let content_y = (screen_y - main_area.y) + scroll_offset_y;
    let idx = prefix_heights.partition_point(|&end| end <= content_y);
    (idx < prefix_heights.len()).then_some(idx)
}
