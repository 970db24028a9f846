// Vaultfill services
// Services talk to the outside world or hold long-lived state: the remote credential
// service, the credential cache, form scanning, settings and local storage.

pub mod credential_cache;
pub mod credential_service;
pub mod form_scanner;
pub mod settings_engine;
pub mod token_store;
