//! # TUI Components
//!
//! Components follow two patterns.
//!
//! Stateless components take everything as props and are rebuilt each frame:
//! `TitleBar`, `MessageView`, `Welcome`, `LightboxView`.
//!
//! Stateful components keep their own state between frames and turn raw
//! [`TuiEvent`](crate::tui::event::TuiEvent)s into higher-level events:
//! `InputBox`, `MessageListState`, `ConversationListState`. The ones with
//! expensive layout (`MessageList`, `ConversationList`) are transient
//! wrappers that borrow their persistent state while rendering.
//!
//! Transcript entries reach the TUI as render trees
//! ([`crate::render::Node`]); `MessageView` draws a tree and maps keys to the
//! commands bound in it, so the terminal offers exactly the operations a
//! browser would.
//!
//! ```text
//! components/
//! ├── title_bar.rs          (title, spinner, status)
//! ├── message.rs            (one transcript entry)
//! ├── message_list.rs       (scrollable transcript, layout cache)
//! ├── input_box.rs          (prompt editor)
//! ├── conversation_list.rs  (Ctrl+O overlay)
//! ├── lightbox.rs           (image overlay)
//! └── welcome.rs            (empty state)
//! ```

pub mod conversation_list;
pub mod input_box;
pub mod lightbox;
pub mod message;
pub mod message_list;
mod title_bar;
mod welcome;

pub use conversation_list::{ConversationEvent, ConversationList, ConversationListState};
pub use input_box::{InputBox, InputEvent};
pub use lightbox::LightboxView;
pub use message::MessageView;
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
pub use welcome::Welcome;
