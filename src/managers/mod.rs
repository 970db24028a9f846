// Vaultfill page-side managers
// Managers own per-page UI and listener state: bindings, the picker, the save prompt
// and the mutation debounce.

pub mod binding_registry;
pub mod credential_picker;
pub mod mutation_watcher;
pub mod save_prompt;
