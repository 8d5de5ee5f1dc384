//! Pure rendering from [`ClientState`] to a [`View`].
//!
//! A [`Display`] applies a view to an actual surface. Views replace each
//! other wholesale; nothing is appended.

use std::io::Write;

use super::state::{CameraStatus, ClientState};

/// Longest description shown on a result card, in characters.
pub const DESCRIPTION_LIMIT: usize = 200;

pub const INVASIVE_LABEL: &str = "INVASIVE SPECIES";
pub const SAFE_LABEL: &str = "Not Invasive";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub submit_enabled: bool,
    pub loading_visible: bool,
    pub file_picker_visible: bool,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Empty,
    Result(ResultCard),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Invasive,
    Safe,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::Invasive => INVASIVE_LABEL,
            Badge::Safe => SAFE_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    pub name: String,
    pub probability_percent: u32,
    pub badge: Badge,
    /// The submitted image as a `data:` URL.
    pub image_data_url: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

pub fn render(state: &ClientState) -> View {
    let content = if state.loading {
        Content::Empty
    } else if let Some(message) = &state.error {
        Content::Error(message.clone())
    } else if let Some(result) = &state.result {
        Content::Result(ResultCard {
            name: result.name.clone(),
            probability_percent: result.probability_percent(),
            badge: if result.is_invasive {
                Badge::Invasive
            } else {
                Badge::Safe
            },
            image_data_url: state.captured_image.as_ref().map(|i| i.to_data_url()),
            description: result.details.description.as_deref().map(truncate_description),
            link: result.details.url.clone(),
        })
    } else {
        Content::Empty
    };

    View {
        submit_enabled: state.submit_enabled && !state.loading,
        loading_visible: state.loading,
        file_picker_visible: matches!(state.camera, CameraStatus::Unavailable { .. }),
        content,
    }
}

/// First [`DESCRIPTION_LIMIT`] characters followed by an ellipsis.
pub fn truncate_description(description: &str) -> String {
    let mut short: String = description.chars().take(DESCRIPTION_LIMIT).collect();
    short.push_str("...");
    short
}

/// A surface that can show a [`View`].
pub trait Display: Send {
    /// Replace whatever is shown with `view`.
    fn apply(&mut self, view: &View);

    /// Show a transient message.
    fn notify(&mut self, message: &str);
}

/// Plain-text display for terminals.
///
/// Only prints when the view actually changes.
pub struct TerminalDisplay<W: Write + Send> {
    out: W,
    last: Option<View>,
}

impl TerminalDisplay<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_view(&mut self, view: &View) -> std::io::Result<()> {
        if view.loading_visible {
            writeln!(self.out, "Identifying...")?;
        }
        if view.file_picker_visible && self.last.as_ref().is_none_or(|v| !v.file_picker_visible)
        {
            writeln!(self.out, "Select a photo file to upload.")?;
        }
        match &view.content {
            Content::Empty => {}
            Content::Error(message) => writeln!(self.out, "Error: {message}")?,
            Content::Result(card) => {
                writeln!(self.out, "{}", card.name)?;
                writeln!(self.out, "Probability: {}%", card.probability_percent)?;
                writeln!(self.out, "[{}]", card.badge.label())?;
                if let Some(description) = &card.description {
                    writeln!(self.out, "{description}")?;
                }
                if let Some(link) = &card.link {
                    writeln!(self.out, "More info: {link}")?;
                }
            }
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Display for TerminalDisplay<W> {
    fn apply(&mut self, view: &View) {
        if self.last.as_ref() == Some(view) {
            return;
        }
        if let Err(e) = self.write_view(view) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
        self.last = Some(view.clone());
    }

    fn notify(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "{message}") {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}
