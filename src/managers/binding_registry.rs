//! Binding Registry.
//!
//! Maps a stable form id to the inputs bound for the credential picker, plus a
//! reverse index from each bound password input to its form. The registry is
//! cleared and rebuilt on every binding pass, so a binding from an earlier
//! scan can never fire after the page changed.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::services::form_scanner::FormBinding;
use crate::types::page::NodeId;

/// Trait defining binding registry operations.
pub trait BindingRegistryTrait {
    /// Replaces every binding. Forms without a password input are skipped.
    fn rebuild(&mut self, bindings: &[FormBinding]) -> usize;
    fn clear(&mut self);
    fn get(&self, form: NodeId) -> Option<&FormBinding>;
    /// The binding whose password input is `target`.
    fn binding_for_trigger(&self, target: NodeId) -> Option<&FormBinding>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    /// Incremented on every rebuild or clear.
    fn generation(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct BindingRegistry {
    forms: BTreeMap<NodeId, FormBinding>,
    by_password: HashMap<NodeId, NodeId>,
    generation: u64,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound forms in document-id order.
    pub fn bindings(&self) -> impl Iterator<Item = &FormBinding> {
        self.forms.values()
    }
}

impl BindingRegistryTrait for BindingRegistry {
    fn rebuild(&mut self, bindings: &[FormBinding]) -> usize {
        self.clear();
        for binding in bindings {
            let Some(password) = binding.password else {
                continue;
            };
            self.by_password.insert(password, binding.form);
            self.forms.insert(binding.form, *binding);
        }
        debug!(
            bound = self.forms.len(),
            generation = self.generation,
            "binding registry rebuilt"
        );
        self.forms.len()
    }

    fn clear(&mut self) {
        self.forms.clear();
        self.by_password.clear();
        self.generation += 1;
    }

    fn get(&self, form: NodeId) -> Option<&FormBinding> {
        self.forms.get(&form)
    }

    fn binding_for_trigger(&self, target: NodeId) -> Option<&FormBinding> {
        let form = self.by_password.get(&target)?;
        self.forms.get(form)
    }

    fn len(&self) -> usize {
        self.forms.len()
    }

    fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}
