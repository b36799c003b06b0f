//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core `Action` values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Effects
//!
//! Every effect returned by `update` is run on its own tokio task and its
//! completion comes back over an `mpsc` channel, so a slow generation never
//! blocks a conversation switch or a download. `Copy` is handled here with an
//! OSC 52 escape sequence.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (a request in flight): draws every ~80ms for the spinner.
//! - **Idle**: sleeps up to 500ms, only redraws on events or completions.

mod component;
mod components;
mod event;
mod ui;

use std::io::{Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};

use crate::api::{ApiClient, ImageAttachment, Mode};
use crate::core::action::{Action, Effect, update};
use crate::core::config::{ResolvedConfig, expand_home};
use crate::core::effects::{Services, perform};
use crate::core::media::{Dictation, detect_dictation};
use crate::core::state::{App, Operation};
use crate::render::{Node, render_entry};
use crate::tui::component::EventHandler;
use crate::tui::components::message::{command_for_key, media_items};
use crate::tui::components::{
    ConversationEvent, ConversationListState, InputBox, InputEvent, MessageListState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Modal input mode: determines how keyboard events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigate transcript entries; letter keys run the selected entry's commands.
    Cursor,
    /// Text editing in the input box. Esc switches to Cursor.
    Input,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub input_mode: InputMode,
    pub pulse_value: f32,
    /// Conversation overlay (None = hidden)
    pub conversation_list: Option<ConversationListState>,
    /// Conversation the transcript view was last laid out for
    shown_conversation: Option<String>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            input_mode: InputMode::Input, // User expects to type immediately
            pulse_value: 0.0,
            conversation_list: None,
            shown_conversation: None,
        }
    }

    /// Copy core state into component props before drawing.
    pub fn sync_props(&mut self, app: &App) {
        let active = app.store.active().map(str::to_string);
        if active != self.shown_conversation {
            self.message_list = MessageListState::new();
            self.shown_conversation = active;
        }

        let input = &mut self.input_box;
        input.sync(&app.compose.text);
        input.mode = app.compose.mode;
        input.placeholder = app.compose.placeholder.clone();
        input.attachment = app
            .compose
            .attached_image
            .as_ref()
            .map(|image| image.file_name.clone());
        input.refining = app.compose.selected_refinement.is_some();
        input.listening = app.is_busy(&Operation::Dictation);
    }

    /// Render tree of the selected transcript entry.
    fn selected_node(&self, app: &App) -> Option<Node> {
        let entry = app.transcript.entries().get(self.message_list.selected_index?)?;
        Some(render_entry(
            entry,
            app.compose.selected_refinement.as_deref(),
        ))
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol allows Shift+Enter detection; terminals
        // without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Runs `update` and hands the resulting effect to a background task.
struct Dispatcher {
    services: Services,
    tx: mpsc::Sender<Action>,
}

impl Dispatcher {
    /// Returns true when the app should quit.
    fn dispatch(&self, app: &mut App, action: Action) -> bool {
        match update(app, action) {
            Effect::Quit => return true,
            Effect::None => {}
            Effect::Copy(text) => copy_to_clipboard(&text),
            effect => self.spawn(effect),
        }
        false
    }

    fn spawn(&self, effect: Effect) {
        debug!("Spawning effect: {:?}", effect);
        let services = self.services.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Some(action) = perform(&services, effect).await
                && tx.send(action).is_err()
            {
                warn!("Failed to deliver completion: receiver dropped");
            }
        });
    }
}

/// Hands text to the terminal's clipboard via OSC 52.
fn copy_to_clipboard(text: &str) {
    let sequence = format!("\x1b]52;c;{}\x07", BASE64.encode(text));
    let mut out = stdout();
    if let Err(e) = out.write_all(sequence.as_bytes()).and_then(|()| out.flush()) {
        warn!("Clipboard write failed: {}", e);
    }
}

/// Input box commands that act on the compose area or the conversation.
#[derive(Debug, Clone, PartialEq)]
enum SlashCommand {
    Attach(PathBuf),
    Detach,
    Rename(String),
    New,
    Mode(Mode),
    Refresh,
}

/// `None` when `text` is not a command at all. Unknown `/words` are
/// ordinary prompts.
fn parse_slash_command(text: &str) -> Option<Result<SlashCommand, String>> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, arg)| (name, arg.trim()));
    Some(match (name, arg) {
        ("attach", "") => Err("Usage: /attach <path>".to_string()),
        ("attach", path) => Ok(SlashCommand::Attach(expand_home(path))),
        ("detach", _) => Ok(SlashCommand::Detach),
        ("rename", "") => Err("Usage: /rename <title>".to_string()),
        ("rename", title) => Ok(SlashCommand::Rename(title.to_string())),
        ("new", _) => Ok(SlashCommand::New),
        ("refresh", _) => Ok(SlashCommand::Refresh),
        ("mode", "auto") => Ok(SlashCommand::Mode(Mode::Auto)),
        ("mode", "image") => Ok(SlashCommand::Mode(Mode::Image)),
        ("mode", "video") => Ok(SlashCommand::Mode(Mode::Video)),
        ("mode", _) => Err("Usage: /mode auto|image|video".to_string()),
        _ => return None,
    })
}

fn read_attachment(path: &Path) -> Result<ImageAttachment, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Could not read {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageAttachment::from_bytes(file_name, bytes))
}

fn slash_action(command: SlashCommand, app: &App) -> Action {
    match command {
        SlashCommand::Attach(path) => match read_attachment(&path) {
            Ok(image) => Action::AttachImage(image),
            Err(message) => {
                warn!("{}", message);
                Action::Notify(message)
            }
        },
        SlashCommand::Detach => Action::ClearImage,
        SlashCommand::Rename(title) => match app.store.active() {
            Some(id) => Action::RenameConversation {
                id: id.to_string(),
                title,
            },
            None => Action::Notify("No conversation to rename".to_string()),
        },
        SlashCommand::New => Action::NewChat,
        SlashCommand::Mode(mode) => Action::SetMode(mode),
        SlashCommand::Refresh => Action::RefreshConversations,
    }
}

fn select_last_entry(tui: &mut TuiState, app: &App) {
    let len = app.transcript.len();
    tui.message_list.select(len.checked_sub(1));
    tui.message_list.scroll_to_selected();
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    info!("Connecting to {}", config.base_url);
    let backend = Arc::new(ApiClient::new(config.base_url.clone()));
    let dictation: Option<Arc<dyn Dictation>> =
        detect_dictation(config.dictation_command.as_deref()).map(Arc::from);
    match &dictation {
        Some(d) => info!("Dictation available via {}", d.name()),
        None => info!("Dictation unavailable"),
    }

    let mut app = App::new().with_dictation(dictation.is_some());
    let services =
        Services::new(backend, config.download_dir.clone()).with_dictation(dictation);
    let mut tui = TuiState::new();

    let (tx, rx) = mpsc::channel();
    let dispatcher = Dispatcher { services, tx };
    dispatcher.spawn(Effect::RefreshConversations);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = std::time::Instant::now();
    let mut needs_redraw = true;

    loop {
        tui.sync_props(&app);
        let animating = app.is_loading();

        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            let spinner_frame = (elapsed * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            std::time::Duration::from_millis(80)
        } else {
            std::time::Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if matches!(event, TuiEvent::Resize) {
                continue;
            }
            if matches!(event, TuiEvent::ForceQuit) {
                should_quit |= dispatcher.dispatch(&mut app, Action::Quit);
                continue;
            }

            // Conversation overlay takes every key while open
            if let Some(list) = tui.conversation_list.as_mut() {
                let Some(list_event) = list.handle_event(&event, app.store.conversations())
                else {
                    continue;
                };
                let action = match list_event {
                    ConversationEvent::Open(id) => {
                        tui.conversation_list = None;
                        Action::SelectConversation(id)
                    }
                    ConversationEvent::New => {
                        tui.conversation_list = None;
                        Action::NewChat
                    }
                    ConversationEvent::Delete(id) => Action::DeleteConversation(id),
                    ConversationEvent::Rename { id, title } => {
                        Action::RenameConversation { id, title }
                    }
                    ConversationEvent::Refresh => Action::RefreshConversations,
                    ConversationEvent::Dismiss => {
                        tui.conversation_list = None;
                        continue;
                    }
                };
                should_quit |= dispatcher.dispatch(&mut app, action);
                continue;
            }

            // Lightbox: Esc closes, d downloads
            if let Some(lightbox) = &app.lightbox {
                let action = match event {
                    TuiEvent::Escape => Some(Action::CloseLightbox),
                    TuiEvent::InputChar('d') => Some(Action::Download(lightbox.url.clone())),
                    _ => None,
                };
                if let Some(action) = action {
                    should_quit |= dispatcher.dispatch(&mut app, action);
                }
                continue;
            }

            // Global shortcuts
            let global = match event {
                TuiEvent::OpenConversations => {
                    tui.conversation_list = Some(ConversationListState::opened_at(&app.store));
                    Some(Action::RefreshConversations)
                }
                TuiEvent::NewChat => Some(Action::NewChat),
                TuiEvent::CycleMode => Some(Action::CycleMode),
                TuiEvent::Dictate => Some(Action::StartDictation),
                TuiEvent::RefreshConversations => Some(Action::RefreshConversations),
                _ => None,
            };
            if let Some(action) = global {
                should_quit |= dispatcher.dispatch(&mut app, action);
                continue;
            }

            let input_height = tui.input_box.calculate_height(terminal.get_frame().area().width);
            match event {
                TuiEvent::MouseMove(_, row) | TuiEvent::MouseClick(_, row) => {
                    let hit = ui::hit_test_message(
                        row,
                        terminal.get_frame().area(),
                        input_height,
                        tui.message_list.scroll_state.offset().y,
                        &tui.message_list.layout.prefix_heights,
                    );
                    if matches!(event, TuiEvent::MouseClick(..)) {
                        if hit.is_some() {
                            tui.input_mode = InputMode::Cursor;
                        }
                        tui.message_list.select(hit);
                    } else if tui.input_mode == InputMode::Cursor && hit.is_some() {
                        tui.message_list.select(hit);
                    }
                    continue;
                }
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown => {
                    tui.message_list.handle_event(&event);
                    continue;
                }
                _ => {}
            }

            match tui.input_mode {
                InputMode::Input => {
                    if matches!(event, TuiEvent::Escape) {
                        tui.input_mode = InputMode::Cursor;
                        select_last_entry(&mut tui, &app);
                        continue;
                    }
                    let Some(input_event) = tui.input_box.handle_event(&event) else {
                        continue;
                    };
                    let action = match input_event {
                        InputEvent::ContentChanged => {
                            Action::SetText(tui.input_box.buffer.clone())
                        }
                        InputEvent::CycleMode => Action::CycleMode,
                        InputEvent::Submit => match parse_slash_command(&tui.input_box.buffer) {
                            None => Action::Submit,
                            Some(parsed) => {
                                should_quit |=
                                    dispatcher.dispatch(&mut app, Action::SetText(String::new()));
                                match parsed {
                                    Ok(command) => slash_action(command, &app),
                                    Err(message) => Action::Notify(message),
                                }
                            }
                        },
                    };
                    should_quit |= dispatcher.dispatch(&mut app, action);
                }
                InputMode::Cursor => match event {
                    TuiEvent::Escape => {}
                    TuiEvent::Submit => {
                        tui.input_mode = InputMode::Input;
                        tui.message_list.select(None);
                    }
                    TuiEvent::CursorUp => {
                        let len = app.transcript.len();
                        if len > 0 {
                            let idx = tui
                                .message_list
                                .selected_index
                                .map_or(len - 1, |i| i.saturating_sub(1));
                            tui.message_list.select(Some(idx));
                            tui.message_list.scroll_to_selected();
                        }
                    }
                    TuiEvent::CursorDown => {
                        if let Some(idx) = tui.message_list.selected_index
                            && idx + 1 < app.transcript.len()
                        {
                            tui.message_list.select(Some(idx + 1));
                            tui.message_list.scroll_to_selected();
                        }
                    }
                    TuiEvent::Tab => {
                        if let Some(node) = tui.selected_node(&app) {
                            tui.message_list.focus_next_media(media_items(&node).len());
                        }
                    }
                    TuiEvent::InputChar(c) if "svdryu".contains(c) => {
                        let command = tui.selected_node(&app).and_then(|node| {
                            command_for_key(&node, tui.message_list.focused_media, c)
                        });
                        if let Some(command) = command {
                            should_quit |= dispatcher.dispatch(&mut app, command.into_action());
                        }
                    }
                    // Typing switches to Input mode and forwards the key
                    TuiEvent::InputChar(_) | TuiEvent::Paste(_) => {
                        tui.input_mode = InputMode::Input;
                        tui.message_list.select(None);
                        if let Some(InputEvent::ContentChanged) = tui.input_box.handle_event(&event)
                        {
                            should_quit |= dispatcher
                                .dispatch(&mut app, Action::SetText(tui.input_box.buffer.clone()));
                        }
                    }
                    _ => {}
                },
            }
        }

        if should_quit {
            break;
        }

        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if dispatcher.dispatch(&mut app, action) {
                should_quit = true;
            }
        }
        if should_quit {
            break;
        }
    }

    ratatui::restore();
    Ok(())
}
