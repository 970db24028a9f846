// Vaultfill shared type definitions
// Each submodule defines types used by both the page context and the background context.

pub mod credential;
pub mod errors;
pub mod message;
pub mod page;
pub mod settings;
