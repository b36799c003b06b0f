//! # Message Renderer
//!
//! Pure functions from state to a declarative render tree. Front ends
//! walk the tree: the TUI draws it with ratatui, [`html::to_html`] turns it
//! into escaped markup for a browser surface.
//!
//! User and server text is always a [`Node::Text`] leaf or an attribute
//! value, never markup. Interactive nodes carry a typed [`Command`] that
//! maps back to an [`Action`], never a string of code.
//!
//! ```text
//! div.message.assistant            key = message id
//! ├── div.message-content          formatted text
//! ├── div.media-grid.grid-N        only when there are generated contents
//! │   └── div.media-item[.selected]
//! │       ├── img | video
//! │       └── button.lightbox / button.download
//! └── div.message-actions          assistant only: regenerate, copy
//! ```

pub mod format;
pub mod html;

use crate::api::{Conversation, GeneratedContent, Message, Role};
use crate::core::action::Action;
use crate::core::media::is_video_url;
use crate::core::state::App;
use crate::core::store::ConversationStore;
use crate::core::transcript::Entry;

pub use format::format_text;
pub use html::to_html;

/// Grid density classes stop growing here.
pub const MAX_GRID_CLASS: usize = 6;

pub const WELCOME_HEADING: &str = "Welcome to Vizzy";
pub const WELCOME_TEXT: &str =
    "Describe an image or video and Vizzy will create it. Select a result to refine it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Div,
    Span,
    P,
    H1,
    Strong,
    Em,
    Br,
    Img,
    Video,
    Button,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::Span => "span",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::Strong => "strong",
            Tag::Em => "em",
            Tag::Br => "br",
            Tag::Img => "img",
            Tag::Video => "video",
            Tag::Button => "button",
        }
    }

    /// Elements that never have children or a closing tag.
    pub fn is_void(self) -> bool {
        matches!(self, Tag::Br | Tag::Img)
    }
}

/// A user-triggerable operation bound to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectRefinement(String),
    OpenLightbox { url: String, title: String },
    Download(String),
    Regenerate(String),
    Copy(String),
    Restore(String),
    SelectConversation(String),
    DeleteConversation(String),
    NewChat,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SelectRefinement(_) => "select-refinement",
            Command::OpenLightbox { .. } => "open-lightbox",
            Command::Download(_) => "download",
            Command::Regenerate(_) => "regenerate",
            Command::Copy(_) => "copy",
            Command::Restore(_) => "restore",
            Command::SelectConversation(_) => "select-conversation",
            Command::DeleteConversation(_) => "delete-conversation",
            Command::NewChat => "new-chat",
        }
    }

    /// The id or URL the command operates on.
    pub fn target(&self) -> Option<&str> {
        match self {
            Command::SelectRefinement(t)
            | Command::Download(t)
            | Command::Regenerate(t)
            | Command::Copy(t)
            | Command::Restore(t)
            | Command::SelectConversation(t)
            | Command::DeleteConversation(t) => Some(t),
            Command::OpenLightbox { url, .. } => Some(url),
            Command::NewChat => None,
        }
    }

    pub fn into_action(self) -> Action {
        match self {
            Command::SelectRefinement(url) => Action::SelectRefinement(url),
            Command::OpenLightbox { url, title } => Action::OpenLightbox { url, title },
            Command::Download(url) => Action::Download(url),
            Command::Regenerate(id) => Action::Regenerate(id),
            Command::Copy(id) => Action::Copy(id),
            Command::Restore(id) => Action::Restore(id),
            Command::SelectConversation(id) => Action::SelectConversation(id),
            Command::DeleteConversation(id) => Action::DeleteConversation(id),
            Command::NewChat => Action::NewChat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text content, like the DOM's `textContent`.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => e.children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    /// Depth-first search over elements, this node included.
    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.walk(&mut |e| {
            if pred(e) {
                found.push(e);
            }
        });
        found
    }

    pub fn find_class(&self, class: &str) -> Option<&Element> {
        self.find_all(&|e| e.has_class(class)).into_iter().next()
    }

    /// Every command bound anywhere in the tree, in document order.
    pub fn commands(&self) -> Vec<&Command> {
        let mut commands = Vec::new();
        self.walk(&mut |e| commands.extend(e.on_click.as_ref()));
        commands
    }

    fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Element)) {
        if let Node::Element(e) = self {
            visit(e);
            for child in &e.children {
                child.walk(visit);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub key: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub on_click: Option<Command>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            key: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            on_click: None,
            children: Vec::new(),
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn on_click(mut self, command: Command) -> Self {
        self.on_click = Some(command);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn button(class: &str, label: &str, command: Command) -> Element {
    Element::new(Tag::Button)
        .class(class)
        .attr("title", label)
        .on_click(command)
        .text(label)
}

fn role_class(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

fn render_media_item(content: &GeneratedContent, selected_refinement: Option<&str>) -> Node {
    let url = &content.image_url;
    let mut item = Element::new(Tag::Div).class("media-item");

    if is_video_url(url) {
        item = item
            .class("video")
            .child(
                Element::new(Tag::Video)
                    .attr("src", url.as_str())
                    .attr("controls", "")
                    .attr("loop", "")
                    .attr("muted", ""),
            )
            .child(button("download", "Download", Command::Download(url.clone())));
    } else {
        if selected_refinement == Some(url.as_str()) {
            item = item.class("selected");
        }
        item = item
            .class("image")
            .child(
                Element::new(Tag::Img)
                    .attr("src", url.as_str())
                    .attr("alt", content.title.as_str())
                    .on_click(Command::SelectRefinement(url.clone())),
            )
            .child(button(
                "lightbox",
                "View",
                Command::OpenLightbox {
                    url: url.clone(),
                    title: content.title.clone(),
                },
            ))
            .child(button("download", "Download", Command::Download(url.clone())));
    }

    if !content.title.is_empty() {
        item = item.child(
            Element::new(Tag::Span)
                .class("media-title")
                .text(content.title.as_str()),
        );
    }
    item.into()
}

/// Renders one message. `selected_refinement` marks the image currently
/// chosen for refinement.
pub fn render_message(message: &Message, selected_refinement: Option<&str>) -> Node {
    let mut root = Element::new(Tag::Div)
        .key(message.id.as_str())
        .class("message")
        .class(role_class(message.role))
        .child(
            Element::new(Tag::Div)
                .class("message-content")
                .children(format_text(&message.content)),
        );

    let contents = &message.generated_contents;
    if !contents.is_empty() {
        root = root.child(
            Element::new(Tag::Div)
                .class("media-grid")
                .class(format!("grid-{}", contents.len().min(MAX_GRID_CLASS)))
                .children(
                    contents
                        .iter()
                        .map(|c| render_media_item(c, selected_refinement)),
                ),
        );
    }

    if message.role == Role::Assistant {
        root = root.child(
            Element::new(Tag::Div)
                .class("message-actions")
                .child(button(
                    "regenerate",
                    "Regenerate",
                    Command::Regenerate(message.id.clone()),
                ))
                .child(button("copy", "Copy", Command::Copy(message.id.clone()))),
        );
    }

    root.into()
}

/// Renders any transcript entry, placeholders included.
pub fn render_entry(entry: &Entry, selected_refinement: Option<&str>) -> Node {
    match entry {
        Entry::Message(message) => render_message(message, selected_refinement),
        Entry::Typing => Element::new(Tag::Div)
            .key(entry.key())
            .class("message")
            .class("assistant")
            .class("typing")
            .child(
                Element::new(Tag::Div)
                    .class("message-content")
                    .text("Vizzy is creating..."),
            )
            .into(),
        Entry::Regenerating { original } => Element::new(Tag::Div)
            .key(original.id.as_str())
            .class("message")
            .class("assistant")
            .class("regenerating")
            .child(
                Element::new(Tag::Div)
                    .class("message-content")
                    .text("Regenerating..."),
            )
            .into(),
        Entry::Failed { id, text, original } => {
            let mut root = Element::new(Tag::Div)
                .key(id.as_str())
                .class("message")
                .class("assistant")
                .class("error")
                .child(
                    Element::new(Tag::Div)
                        .class("message-content")
                        .text(text.as_str()),
                );
            if let Some(original) = original {
                root = root.child(
                    Element::new(Tag::Div).class("message-actions").child(button(
                        "restore",
                        "Restore",
                        Command::Restore(original.id.clone()),
                    )),
                );
            }
            root.into()
        }
    }
}

pub fn render_welcome() -> Node {
    Element::new(Tag::Div)
        .class("welcome")
        .child(Element::new(Tag::H1).text(WELCOME_HEADING))
        .child(Element::new(Tag::P).text(WELCOME_TEXT))
        .into()
}

/// The conversation pane: the welcome state, or every transcript entry.
pub fn render_view(app: &App) -> Node {
    if app.is_welcome() {
        return render_welcome();
    }
    let selected = app.compose.selected_refinement.as_deref();
    Element::new(Tag::Div)
        .class("messages")
        .children(
            app.transcript
                .entries()
                .iter()
                .map(|e| render_entry(e, selected)),
        )
        .into()
}

fn render_conversation(conversation: &Conversation, active: bool) -> Node {
    let mut item = Element::new(Tag::Div)
        .key(conversation.id.as_str())
        .class("conversation-item");
    if active {
        item = item.class("active");
    }
    item.child(
        Element::new(Tag::Span)
            .class("conversation-title")
            .on_click(Command::SelectConversation(conversation.id.clone()))
            .text(conversation.title.as_str()),
    )
    .child(button(
        "delete",
        "Delete",
        Command::DeleteConversation(conversation.id.clone()),
    ))
    .into()
}

/// The sidebar: a new-chat button and the conversations in server order.
pub fn render_conversation_list(store: &ConversationStore) -> Node {
    Element::new(Tag::Div)
        .class("conversation-list")
        .child(button("new-chat", "New Chat", Command::NewChat))
        .children(
            store
                .conversations()
                .iter()
                .map(|c| render_conversation(c, store.is_active(&c.id))),
        )
        .into()
}
