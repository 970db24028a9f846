//! Form Scanner.
//!
//! Finds login-form candidates and their username/password inputs in a page
//! document. A password input inside the form is the primary signal; the
//! `action` substring patterns catch login forms whose password field has not
//! been rendered yet.

use tracing::debug;

use crate::page::Document;
use crate::types::page::NodeId;

/// Substrings of a form's `action` attribute that mark it as a login form.
pub const LOGIN_ACTION_PATTERNS: [&str; 7] = [
    "login", "signin", "auth", "account", "user", "session", "password",
];

/// Substrings of a text input's `name` that mark it as a username field.
const USERNAME_NAME_HINTS: [&str; 3] = ["user", "email", "login"];

/// A detected form and its resolved inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormBinding {
    pub form: NodeId,
    pub username: Option<NodeId>,
    pub password: Option<NodeId>,
}

/// Trait defining form scanning operations.
pub trait FormScannerTrait {
    fn scan(&self, doc: &Document) -> Vec<FormBinding>;
    fn is_login_form(&self, doc: &Document, form: NodeId) -> bool;
    fn find_username_field(&self, doc: &Document, form: NodeId) -> Option<NodeId>;
    fn find_password_field(&self, doc: &Document, form: NodeId) -> Option<NodeId>;
    /// Document-wide username/password pair for a direct fill.
    fn find_fill_targets(&self, doc: &Document) -> Option<(NodeId, NodeId)>;
}

/// Heuristic scanner over the page document.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormScanner;

impl FormScanner {
    pub fn new() -> Self {
        Self
    }

    /// Inputs under `root` that belong to the page, in document order.
    fn page_inputs(doc: &Document, root: NodeId) -> Vec<(NodeId, String)> {
        doc.descendants(root)
            .into_iter()
            .filter(|id| !doc.is_owned(*id))
            .filter_map(|id| doc.input_type(id).map(|t| (id, t)))
            .collect()
    }

    fn name_hints_username(doc: &Document, id: NodeId) -> bool {
        let name = doc.attribute(id, "name").unwrap_or_default().to_ascii_lowercase();
        USERNAME_NAME_HINTS.iter().any(|hint| name.contains(hint))
    }
}

impl FormScannerTrait for FormScanner {
    fn scan(&self, doc: &Document) -> Vec<FormBinding> {
        let bindings: Vec<FormBinding> = doc
            .forms()
            .into_iter()
            .filter(|form| !doc.is_owned(*form))
            .filter(|form| self.is_login_form(doc, *form))
            .map(|form| FormBinding {
                form,
                username: self.find_username_field(doc, form),
                password: self.find_password_field(doc, form),
            })
            .collect();
        debug!(count = bindings.len(), "scanned login forms");
        bindings
    }

    fn is_login_form(&self, doc: &Document, form: NodeId) -> bool {
        if self.find_password_field(doc, form).is_some() {
            return true;
        }
        let action = doc.attribute(form, "action").unwrap_or_default();
        LOGIN_ACTION_PATTERNS.iter().any(|p| action.contains(p))
    }

    fn find_username_field(&self, doc: &Document, form: NodeId) -> Option<NodeId> {
        let inputs = Self::page_inputs(doc, form);

        // Priority: email input, then a text input named like a username,
        // then any text or email input.
        inputs
            .iter()
            .find(|(_, t)| t == "email")
            .or_else(|| {
                inputs
                    .iter()
                    .find(|(id, t)| t == "text" && Self::name_hints_username(doc, *id))
            })
            .or_else(|| inputs.iter().find(|(_, t)| t == "text" || t == "email"))
            .map(|(id, _)| *id)
    }

    fn find_password_field(&self, doc: &Document, form: NodeId) -> Option<NodeId> {
        Self::page_inputs(doc, form)
            .into_iter()
            .find(|(_, t)| t == "password")
            .map(|(id, _)| id)
    }

    fn find_fill_targets(&self, doc: &Document) -> Option<(NodeId, NodeId)> {
        let inputs = Self::page_inputs(doc, doc.body());
        let username = inputs.iter().find(|(id, t)| {
            t == "text"
                || t == "email"
                || matches!(doc.attribute(*id, "name"), Some("username") | Some("email"))
        })?;
        let password = inputs.iter().find(|(_, t)| t == "password")?;
        Some((username.0, password.0))
    }
}
