//! Outbound render instructions
//!
//! Domain code never talks to the chat transport. It returns `Reply` values
//! which the bot crate turns into Telegram messages and keyboards.

/// Button of a reply keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Text(String),
    /// Asks the client to share the current location
    RequestLocation(String),
}

impl Button {
    pub fn text(label: impl Into<String>) -> Self {
        Button::Text(label.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Button::Text(label) | Button::RequestLocation(label) => label,
        }
    }
}

/// Button attached to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineButton {
    Callback { label: String, data: String },
    Url { label: String, url: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave the current keyboard as it is
    #[default]
    None,
    Reply(Vec<Vec<Button>>),
    Remove,
    Inline(Vec<Vec<InlineButton>>),
}

/// A single outbound message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Text is HTML formatted
    pub html: bool,
    /// Send as a photo with `text` as caption
    pub photo: Option<String>,
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }

    #[must_use]
    pub fn with_photo(mut self, file_id: Option<String>) -> Self {
        self.photo = file_id;
        self
    }

    /// Labels of every reply-keyboard button, row by row
    pub fn button_labels(&self) -> Vec<&str> {
        match &self.keyboard {
            Keyboard::Reply(rows) => rows.iter().flatten().map(Button::label).collect(),
            Keyboard::Inline(rows) => rows
                .iter()
                .flatten()
                .map(|b| match b {
                    InlineButton::Callback { label, .. } | InlineButton::Url { label, .. } => {
                        label.as_str()
                    }
                })
                .collect(),
            Keyboard::None | Keyboard::Remove => Vec::new(),
        }
    }
}

/// Lay out text buttons `per_row` to a row
pub fn grid<I, S>(labels: I, per_row: usize) -> Vec<Vec<Button>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut rows: Vec<Vec<Button>> = Vec::new();
    for label in labels {
        match rows.last_mut() {
            Some(row) if row.len() < per_row.max(1) => row.push(Button::text(label)),
            _ => rows.push(vec![Button::text(label)]),
        }
    }
    rows
}
