//! Credential Picker.
//!
//! A floating list anchored below a password field, one entry per stored
//! credential. Only one panel exists at a time. Outside clicks dismiss it,
//! but only after a short arming delay so the click that opened the panel
//! does not close it again.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::page::document::OWNED_MARKER;
use crate::page::Document;
use crate::services::form_scanner::FormBinding;
use crate::types::credential::Credential;
use crate::types::errors::PageError;
use crate::types::page::{NodeId, PanelPosition};

pub const PICKER_DOM_ID: &str = "password-manager-dropdown";

/// What a click meant to the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerClick {
    /// No panel is open.
    Closed,
    /// An entry was chosen and both fields were filled.
    Selected { identifier: String },
    /// The click landed outside and closed the panel.
    Dismissed,
    /// The click was inside the panel, on the anchor, or before arming.
    Ignored,
}

#[derive(Debug)]
struct PickerEntry {
    node: NodeId,
    credential: Credential,
}

/// The currently rendered panel.
#[derive(Debug)]
pub struct PickerPanel {
    pub root: NodeId,
    pub anchor: NodeId,
    pub username: Option<NodeId>,
    pub position: PanelPosition,
    entries: Vec<PickerEntry>,
    armed_at: Instant,
}

impl PickerPanel {
    pub fn entry_nodes(&self) -> Vec<NodeId> {
        self.entries.iter().map(|e| e.node).collect()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.credential.identifier.as_str())
            .collect()
    }
}

#[derive(Debug)]
pub struct CredentialPicker {
    panel: Option<PickerPanel>,
    dismiss_delay: Duration,
}

impl CredentialPicker {
    pub fn new(dismiss_delay: Duration) -> Self {
        Self {
            panel: None,
            dismiss_delay,
        }
    }

    pub fn is_open(&self) -> bool {
        self.panel.is_some()
    }

    pub fn panel(&self) -> Option<&PickerPanel> {
        self.panel.as_ref()
    }

    /// Renders a panel for `binding`, replacing any existing one.
    pub fn render(
        &mut self,
        doc: &mut Document,
        binding: &FormBinding,
        credentials: &[Credential],
        now: Instant,
    ) -> Result<NodeId, PageError> {
        let anchor = binding.password.ok_or(PageError::NoForm)?;
        self.dismiss(doc);

        let rect = doc
            .bounding_rect(anchor)
            .ok_or(PageError::UnknownNode(anchor.0))?;
        let scroll = doc.scroll_offset();
        let position = PanelPosition {
            top: rect.bottom() + scroll.y,
            left: rect.left() + scroll.x,
        };

        let root = doc.create_element("div");
        doc.set_attribute(root, "id", PICKER_DOM_ID)?;
        doc.set_attribute(root, OWNED_MARKER, "picker")?;
        doc.set_attribute(
            root,
            "style",
            &format!("position: absolute; top: {}px; left: {}px;", position.top, position.left),
        )?;
        let header = doc.append_element(root, "div", &[])?;
        doc.set_text(header, "Saved Credentials")?;

        let mut entries = Vec::with_capacity(credentials.len());
        for credential in credentials {
            let item = doc.append_element(root, "div", &[("role", "option")])?;
            let label = doc.append_element(item, "div", &[])?;
            doc.set_text(label, &credential.identifier)?;
            let origin = doc.append_element(item, "div", &[])?;
            doc.set_text(origin, &credential.origin)?;
            entries.push(PickerEntry {
                node: item,
                credential: credential.clone(),
            });
        }
        let body = doc.body();
        doc.append_child(body, root)?;

        debug!(entries = entries.len(), top = position.top, left = position.left, "picker rendered");
        self.panel = Some(PickerPanel {
            root,
            anchor,
            username: binding.username,
            position,
            entries,
            armed_at: now + self.dismiss_delay,
        });
        Ok(root)
    }

    /// Routes a document click to the open panel.
    pub fn handle_click(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        now: Instant,
    ) -> Result<PickerClick, PageError> {
        let (chosen, ignored) = match &self.panel {
            None => return Ok(PickerClick::Closed),
            Some(panel) => (
                panel.entries.iter().position(|e| doc.contains(e.node, target)),
                doc.contains(panel.root, target)
                    || target == panel.anchor
                    || now < panel.armed_at,
            ),
        };

        if let Some(index) = chosen {
            let identifier = self.select(doc, index)?;
            return Ok(PickerClick::Selected { identifier });
        }
        if ignored {
            return Ok(PickerClick::Ignored);
        }

        debug!("click outside picker, closing");
        self.dismiss(doc);
        Ok(PickerClick::Dismissed)
    }

    /// Fills the form with entry `index` and closes the panel.
    ///
    /// Each field gets a bubbling `input` event so page frameworks see the change.
    pub fn select(&mut self, doc: &mut Document, index: usize) -> Result<String, PageError> {
        let panel = self.panel.as_ref().ok_or(PageError::NoForm)?;
        let entry = panel.entries.get(index).ok_or(PageError::NoForm)?;
        let identifier = entry.credential.identifier.clone();

        if let Some(username) = panel.username {
            doc.set_value(username, &entry.credential.identifier)?;
            doc.dispatch_input_event(username)?;
        }
        doc.set_value(panel.anchor, &entry.credential.secret)?;
        doc.dispatch_input_event(panel.anchor)?;

        info!(identifier = %identifier, "credential selected");
        self.dismiss(doc);
        Ok(identifier)
    }

    pub fn dismiss(&mut self, doc: &mut Document) {
        if let Some(panel) = self.panel.take() {
            let _ = doc.remove(panel.root);
        }
    }
}
