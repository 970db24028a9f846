//! Save Prompt.
//!
//! Asks the user before any typed credentials leave the page. Declining drops
//! the captured values; nothing is persisted.

use tracing::debug;

use crate::page::document::OWNED_MARKER;
use crate::page::Document;
use crate::types::credential::SaveRequest;
use crate::types::errors::PageError;
use crate::types::page::NodeId;

pub const SAVE_PROMPT_DOM_ID: &str = "password-manager-popup";

/// The user's answer to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Accept,
    Decline,
}

#[derive(Debug)]
struct PendingSave {
    request: SaveRequest,
    root: NodeId,
    accept: NodeId,
    decline: NodeId,
}

#[derive(Debug, Default)]
pub struct SavePrompt {
    pending: Option<PendingSave>,
}

impl SavePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_request(&self) -> Option<&SaveRequest> {
        self.pending.as_ref().map(|p| &p.request)
    }

    /// Shows the prompt for `request`, replacing any earlier capture.
    ///
    /// Returns `false` without showing anything when a field is empty.
    pub fn offer(&mut self, doc: &mut Document, request: SaveRequest) -> Result<bool, PageError> {
        if !request.is_complete() {
            return Ok(false);
        }
        self.hide(doc);

        let root = doc.create_element("div");
        doc.set_attribute(root, "id", SAVE_PROMPT_DOM_ID)?;
        doc.set_attribute(root, OWNED_MARKER, "save-prompt")?;
        let title = doc.append_element(root, "h3", &[])?;
        doc.set_text(title, "Save Password?")?;
        let body = doc.append_element(root, "p", &[])?;
        doc.set_text(body, "Do you want to save these credentials in Password Manager?")?;
        let accept = doc.append_element(root, "button", &[("id", "save-password-yes")])?;
        doc.set_text(accept, "Yes")?;
        let decline = doc.append_element(root, "button", &[("id", "save-password-no")])?;
        doc.set_text(decline, "No")?;
        let body = doc.body();
        doc.append_child(body, root)?;

        debug!(origin = %request.website_url, "save prompt shown");
        self.pending = Some(PendingSave {
            request,
            root,
            accept,
            decline,
        });
        Ok(true)
    }

    /// Maps a click on one of the prompt's buttons to an answer.
    pub fn answer_for_click(&self, doc: &Document, target: NodeId) -> Option<PromptAnswer> {
        let pending = self.pending.as_ref()?;
        if doc.contains(pending.accept, target) {
            Some(PromptAnswer::Accept)
        } else if doc.contains(pending.decline, target) {
            Some(PromptAnswer::Decline)
        } else {
            None
        }
    }

    /// Hides the prompt and hands over the captured request for saving.
    pub fn accept(&mut self, doc: &mut Document) -> Option<SaveRequest> {
        let pending = self.pending.take()?;
        let _ = doc.remove(pending.root);
        Some(pending.request)
    }

    /// Hides the prompt and discards the captured values.
    pub fn decline(&mut self, doc: &mut Document) {
        if self.pending.is_some() {
            debug!("save prompt declined");
        }
        self.hide(doc);
    }

    fn hide(&mut self, doc: &mut Document) {
        if let Some(pending) = self.pending.take() {
            let _ = doc.remove(pending.root);
        }
    }
}
