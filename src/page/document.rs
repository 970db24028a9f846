//! In-memory page document.
//!
//! Elements live in an arena indexed by [`NodeId`]. Removing an element only
//! disconnects it; ids stay valid for the lifetime of the document. Every
//! element appended under the connected tree is recorded so the mutation
//! watcher can pick it up, the way a `MutationObserver` sees added nodes.

use std::collections::BTreeMap;

use crate::types::errors::PageError;
use crate::types::page::{DispatchedEvent, NodeId, Rect, ScrollOffset, SyntheticEventKind};

/// Attribute marking elements rendered by the extension itself.
pub const OWNED_MARKER: &str = "data-vaultfill";

/// A single element in the document.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: NodeId,
    pub tag: String,
    attributes: BTreeMap<String, String>,
    value: String,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
}

impl Element {
    fn new(id: NodeId, tag: &str) -> Self {
        Self {
            id,
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            value: String::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            rect: Rect::default(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_input(&self) -> bool {
        self.tag == "input"
    }

    /// Effective input type: the lowercased `type` attribute, `text` when absent.
    pub fn input_type(&self) -> Option<String> {
        if !self.is_input() {
            return None;
        }
        Some(
            self.attribute("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "text".to_string()),
        )
    }
}

/// The page document owned by one page context.
///
/// Slots are never reused, so a stale `NodeId` cannot alias a newer element.
/// The arena and the event and alert logs live as long as the page load and
/// are freed with it.
#[derive(Debug, Clone)]
pub struct Document {
    url: String,
    nodes: Vec<Element>,
    body: NodeId,
    scroll: ScrollOffset,
    added: Vec<NodeId>,
    events: Vec<DispatchedEvent>,
    alerts: Vec<String>,
}

impl Document {
    pub fn new(url: &str) -> Self {
        let body = NodeId(0);
        Self {
            url: url.to_string(),
            nodes: vec![Element::new(body, "body")],
            body,
            scroll: ScrollOffset::default(),
            added: Vec::new(),
            events: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, PageError> {
        self.nodes.get_mut(id.0).ok_or(PageError::UnknownNode(id.0))
    }

    fn require(&self, id: NodeId) -> Result<&Element, PageError> {
        self.element(id).ok_or(PageError::UnknownNode(id.0))
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element::new(id, tag));
        id
    }

    /// Creates an element with attributes and appends it under `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<NodeId, PageError> {
        self.require(parent)?;
        let id = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(id, name, value)?;
        }
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), PageError> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    /// Moves `child` under `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), PageError> {
        self.require(parent)?;
        self.require(child)?;
        if self.contains(child, parent) {
            return Err(PageError::InvalidHierarchy(child.0));
        }
        self.detach(child)?;
        self.element_mut(parent)?.children.push(child);
        self.element_mut(child)?.parent = Some(parent);
        if self.is_connected(parent) {
            self.added.push(child);
        }
        Ok(())
    }

    /// Disconnects `id` (and its subtree) from the document.
    pub fn remove(&mut self, id: NodeId) -> Result<(), PageError> {
        if id == self.body {
            return Err(PageError::InvalidHierarchy(id.0));
        }
        self.detach(id)
    }

    fn detach(&mut self, id: NodeId) -> Result<(), PageError> {
        if let Some(old_parent) = self.element_mut(id)?.parent.take() {
            self.element_mut(old_parent)?.children.retain(|c| *c != id);
        }
        Ok(())
    }

    /// True when `id` is reachable from the body.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.body, id)
    }

    /// Inclusive ancestry test: true when `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.element(id).and_then(|e| e.parent);
        }
        false
    }

    /// Descendants of `root` in document (pre-)order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.element(root) {
            Some(e) => e.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(e) = self.element(id) {
                stack.extend(e.children.iter().rev().copied());
            }
        }
        out
    }

    /// Connected elements with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.descendants(self.body)
            .into_iter()
            .filter(|id| self.element(*id).map(|e| e.tag == tag).unwrap_or(false))
            .collect()
    }

    pub fn forms(&self) -> Vec<NodeId> {
        self.elements_by_tag("form")
    }

    /// First connected element whose `id` attribute equals `dom_id`.
    pub fn find_by_dom_id(&self, dom_id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|id| self.attribute(*id, "id") == Some(dom_id))
    }

    /// Nearest enclosing form of `id`.
    pub fn form_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.element(id)?.parent;
        while let Some(pid) = current {
            let e = self.element(pid)?;
            if e.tag == "form" {
                return Some(pid);
            }
            current = e.parent;
        }
        None
    }

    pub fn input_type(&self, id: NodeId) -> Option<String> {
        self.element(id)?.input_type()
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.value.as_str())
    }

    /// Writes an input's value without dispatching any event.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<(), PageError> {
        let element = self.element_mut(id)?;
        if !element.is_input() {
            return Err(PageError::NotAnInput(id.0));
        }
        element.value = value.to_string();
        Ok(())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.text.as_str())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), PageError> {
        self.element_mut(id)?.text = text.to_string();
        Ok(())
    }

    /// Records a bubbling `input` event on `id`.
    pub fn dispatch_input_event(&mut self, id: NodeId) -> Result<(), PageError> {
        self.require(id)?;
        self.events.push(DispatchedEvent {
            target: id,
            kind: SyntheticEventKind::Input,
            bubbles: true,
        });
        Ok(())
    }

    pub fn dispatched_events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn bounding_rect(&self, id: NodeId) -> Option<Rect> {
        self.element(id).map(|e| e.rect)
    }

    pub fn set_bounding_rect(&mut self, id: NodeId, rect: Rect) -> Result<(), PageError> {
        self.element_mut(id)?.rect = rect;
        Ok(())
    }

    pub fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    pub fn set_scroll_offset(&mut self, scroll: ScrollOffset) {
        self.scroll = scroll;
    }

    /// Drains the nodes added since the last call.
    pub fn take_added_nodes(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.added)
    }

    /// True when `id` or one of its ancestors was rendered by the extension.
    pub fn is_owned(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(e) = self.element(node) else {
                return false;
            };
            if e.attribute(OWNED_MARKER).is_some() {
                return true;
            }
            current = e.parent;
        }
        false
    }

    /// Blocking alert shown to the user.
    pub fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }
}
