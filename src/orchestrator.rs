//! Autofill Orchestrator.
//!
//! One cycle per page-ready or settled mutation burst:
//! `Idle -> CheckingSession -> FetchingCredentials -> Binding -> Idle`.
//! Session check strictly precedes the fetch, which strictly precedes binding.
//! Any failure drops back to `Idle` without surfacing to the user, and
//! leaves the page with no bound credentials.

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::managers::binding_registry::BindingRegistryTrait;
use crate::messenger::ContentMessenger;
use crate::page_context::PageContext;
use crate::services::credential_cache::CredentialCacheTrait;
use crate::services::credential_service::CredentialService;
use crate::services::form_scanner::{FormScanner, FormScannerTrait};
use crate::types::credential::{Credential, CredentialRecord};
use crate::types::settings::{AutofillPolicy, AutofillSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    CheckingSession,
    FetchingCredentials,
    Binding,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The messenger is invalidated; nothing was sent.
    ContextInvalid,
    /// No login form on the page.
    NoForms,
    /// Session check failed or reported logged out.
    LoggedOut,
    /// Every fetch attempt failed.
    FetchFailed { attempts: u32 },
    /// The service has nothing stored for this origin.
    NoCredentials,
    /// Password fields of `forms` login forms now open the picker.
    Bound { forms: usize },
}

pub struct AutofillOrchestrator {
    state: OrchestratorState,
    settings: AutofillSettings,
    scanner: FormScanner,
    cycles: u64,
}

impl AutofillOrchestrator {
    pub fn new(settings: AutofillSettings) -> Self {
        Self {
            state: OrchestratorState::Idle,
            settings,
            scanner: FormScanner::new(),
            cycles: 0,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Number of cycles started since page load.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn transition(&mut self, next: OrchestratorState) {
        debug!(from = ?self.state, to = ?next, "orchestrator transition");
        self.state = next;
    }

    pub async fn run_cycle(
        &mut self,
        ctx: &mut PageContext,
        messenger: &ContentMessenger,
        service: &dyn CredentialService,
    ) -> CycleOutcome {
        self.cycles += 1;
        let outcome = self.cycle(ctx, messenger, service).await;
        if !matches!(outcome, CycleOutcome::Bound { .. }) {
            unbind(ctx);
        }
        self.transition(OrchestratorState::Idle);
        debug!(cycle = self.cycles, outcome = ?outcome, "orchestration cycle finished");
        outcome
    }

    async fn cycle(
        &mut self,
        ctx: &mut PageContext,
        messenger: &ContentMessenger,
        service: &dyn CredentialService,
    ) -> CycleOutcome {
        if !messenger.is_valid() {
            return CycleOutcome::ContextInvalid;
        }

        let bindings = self.scanner.scan(&ctx.document);
        if bindings.is_empty() {
            return CycleOutcome::NoForms;
        }

        self.transition(OrchestratorState::CheckingSession);
        let status = messenger.check_login_status().await;
        if !status.logged_in {
            debug!("not logged in, skipping autofill");
            return CycleOutcome::LoggedOut;
        }

        self.transition(OrchestratorState::FetchingCredentials);
        let credentials = match ctx.cache.get(&ctx.origin) {
            Some(cached) => {
                debug!(origin = %ctx.origin, count = cached.len(), "credential cache hit");
                cached
            }
            None => {
                debug!(origin = %ctx.origin, "credential cache miss");
                match self.fetch_with_retry(service, &ctx.origin).await {
                    Ok(records) => {
                        let credentials = to_credentials(&records, &ctx.origin);
                        ctx.cache.put(&ctx.origin, credentials.clone());
                        credentials
                    }
                    Err(attempts) => return CycleOutcome::FetchFailed { attempts },
                }
            }
        };
        if credentials.is_empty() {
            debug!(origin = %ctx.origin, "no stored credentials");
            return CycleOutcome::NoCredentials;
        }

        self.transition(OrchestratorState::Binding);
        let forms = ctx.registry.rebuild(&bindings);
        ctx.bound_credentials = credentials;
        info!(origin = %ctx.origin, forms, credentials = ctx.bound_credentials.len(), "login forms bound");

        if let AutofillPolicy::Automatic { delay_ms } = self.settings.policy {
            sleep(std::time::Duration::from_millis(delay_ms)).await;
            if let Err(e) = ctx.fill_first_binding() {
                warn!(error = %e, "automatic fill failed");
            }
        }

        CycleOutcome::Bound { forms }
    }

    /// Fetches with a fixed backoff between attempts and none after the last.
    ///
    /// Returns the number of attempts made on failure.
    async fn fetch_with_retry(
        &self,
        service: &dyn CredentialService,
        origin: &str,
    ) -> Result<Vec<CredentialRecord>, u32> {
        let max_attempts = self.settings.max_fetch_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match service.fetch_credentials(origin).await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(origin, attempt, max_attempts, error = %e, "credential fetch failed, retrying");
                    sleep(self.settings.retry_delay()).await;
                }
                Err(e) => {
                    error!(origin, attempts = attempt, error = %e, "credential fetch failed, giving up");
                    return Err(attempt);
                }
            }
        }
    }
}

/// Bindings from an earlier cycle must not outlive a cycle that failed to
/// confirm them.
fn unbind(ctx: &mut PageContext) {
    if !ctx.registry.is_empty() {
        debug!(origin = %ctx.origin, "dropping stale bindings");
    }
    ctx.picker.dismiss(&mut ctx.document);
    ctx.registry.clear();
    ctx.bound_credentials.clear();
}

fn to_credentials(records: &[CredentialRecord], origin: &str) -> Vec<Credential> {
    records
        .iter()
        .filter_map(|r| r.to_credential(origin))
        .collect()
}
