//! Full-size view of one generated image.
//!
//! A terminal cannot show the picture itself, so the overlay shows the title
//! and URL and offers the download.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Wrap};

use crate::core::media::Lightbox;
use crate::tui::component::Component;
use crate::tui::components::conversation_list::centered_rect;

pub struct LightboxView<'a> {
    pub lightbox: &'a Lightbox,
}

impl<'a> LightboxView<'a> {
    pub fn new(lightbox: &'a Lightbox) -> Self {
        Self { lightbox }
    }
}

impl<'a> Component for LightboxView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(70, 40, area);
        frame.render_widget(Clear, overlay);

        let title = if self.lightbox.title.is_empty() {
            "Image".to_string()
        } else {
            self.lightbox.title.clone()
        };
        let block = Block::bordered()
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(Color::Magenta))
            .title(format!(" {title} "))
            .title_bottom(Line::from(" d Download  Esc Close ").centered());

        let body = vec![
            Line::default(),
            Line::from(Span::styled(
                "▣",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled(
                self.lightbox.url.clone(),
                Style::default().fg(Color::Cyan),
            )),
        ];
        let paragraph = Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_lightbox_shows_title_and_url() {
        let lightbox = Lightbox::open("/media/cat.png", "A cat").unwrap();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|f| LightboxView::new(&lightbox).render(f, f.area()))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("A cat"));
        assert!(text.contains("/media/cat.png"));
        assert!(text.contains("Esc Close"));
    }
}
