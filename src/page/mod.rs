// Vaultfill page model
// A headless stand-in for the browser DOM the page-context script observes and edits.

pub mod document;

pub use document::{Document, Element};
