//! Vaultfill: login-form detection, credential autofill and save prompts
//! backed by a remote password service.
//!
//! The page side ([`page_context`]) and the privileged side ([`app`]) share no
//! state; they talk through [`messenger`] and [`message_handler`].

pub mod app;
pub mod managers;
pub mod message_handler;
pub mod messenger;
pub mod orchestrator;
pub mod page;
pub mod page_context;
pub mod platform;
pub mod services;
pub mod types;
