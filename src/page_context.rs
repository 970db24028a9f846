//! Per-page context and its event loop.
//!
//! A [`PageContext`] is created for every page load and holds everything the
//! page side keeps between events: origin, credential cache, form bindings,
//! picker and save prompt. [`PageSession`] drives it from a stream of
//! [`PageEvent`]s and tears it down on navigation.

use std::collections::HashMap;
use std::fmt;
use std::future::pending;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::app::TabBridge;
use crate::managers::binding_registry::{BindingRegistry, BindingRegistryTrait};
use crate::managers::credential_picker::{CredentialPicker, PickerClick};
use crate::managers::mutation_watcher::MutationWatcher;
use crate::managers::save_prompt::{PromptAnswer, SavePrompt};
use crate::messenger::ContentMessenger;
use crate::orchestrator::{AutofillOrchestrator, CycleOutcome};
use crate::page::Document;
use crate::services::credential_cache::{Clock, CredentialCache, CredentialCacheTrait, SystemClock};
use crate::services::credential_service::CredentialService;
use crate::services::form_scanner::{FormBinding, FormScanner, FormScannerTrait};
use crate::types::credential::{Credential, CredentialRecord, SaveRequest};
use crate::types::errors::{ChannelError, PageError};
use crate::types::message::{AckResponse, ActionMessage, ExtensionMessage};
use crate::types::page::NodeId;
use crate::types::settings::{ExtensionSettings, SaveTrigger};

/// Hostname of `url`, the key credentials are stored under.
pub fn origin_of(url: &str) -> Result<String, PageError> {
    let parsed = Url::parse(url).map_err(|e| PageError::InvalidUrl(format!("{}: {}", url, e)))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| PageError::InvalidUrl(format!("{}: no host", url)))
}

/// State owned by one page load.
pub struct PageContext {
    pub id: Uuid,
    pub origin: String,
    pub document: Document,
    pub cache: CredentialCache,
    pub registry: BindingRegistry,
    pub picker: CredentialPicker,
    pub save_prompt: SavePrompt,
    /// Credentials offered by the picker, set in the Binding phase.
    pub bound_credentials: Vec<Credential>,
}

impl PageContext {
    pub fn new(
        mut document: Document,
        settings: &ExtensionSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PageError> {
        let origin = origin_of(document.url())?;
        // Only changes made after the page loaded count as mutations.
        document.take_added_nodes();
        Ok(Self {
            id: Uuid::new_v4(),
            origin,
            document,
            cache: CredentialCache::new(settings.autofill.cache_duration_ms, clock),
            registry: BindingRegistry::new(),
            picker: CredentialPicker::new(settings.autofill.picker_dismiss_delay()),
            save_prompt: SavePrompt::new(),
            bound_credentials: Vec::new(),
        })
    }

    /// Fills the first bound form with the first bound credential.
    pub fn fill_first_binding(&mut self) -> Result<(), PageError> {
        let binding = *self.registry.bindings().next().ok_or(PageError::NoForm)?;
        let credential = self.bound_credentials.first().ok_or(PageError::NoForm)?.clone();
        fill_binding(&mut self.document, &binding, &credential.identifier, &credential.secret)
    }

    /// Direct fill from an `autofill` message: the first username candidate
    /// and the first password input anywhere on the page.
    pub fn fill_from_record(&mut self, record: &CredentialRecord) -> Result<(), PageError> {
        let (username, password) = FormScanner::new()
            .find_fill_targets(&self.document)
            .ok_or(PageError::NoForm)?;
        // The username field takes the account's username; email only stands in for it.
        let identifier = record
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(record.email.as_deref())
            .unwrap_or_default()
            .to_string();
        self.document.set_value(username, &identifier)?;
        self.document.dispatch_input_event(username)?;
        self.document.set_value(password, &record.password)?;
        self.document.dispatch_input_event(password)?;
        info!(origin = %self.origin, "form filled from autofill message");
        Ok(())
    }

    /// Drops every page-side artifact; called when the page goes away.
    pub fn teardown(&mut self) {
        self.picker.dismiss(&mut self.document);
        self.save_prompt.decline(&mut self.document);
        self.registry.clear();
        self.cache.invalidate();
        self.bound_credentials.clear();
    }
}

fn fill_binding(
    doc: &mut Document,
    binding: &FormBinding,
    identifier: &str,
    secret: &str,
) -> Result<(), PageError> {
    let password = binding.password.ok_or(PageError::NoForm)?;
    if let Some(username) = binding.username {
        doc.set_value(username, identifier)?;
        doc.dispatch_input_event(username)?;
    }
    doc.set_value(password, secret)?;
    doc.dispatch_input_event(password)?;
    Ok(())
}

/// Something that happened on the page.
pub enum PageEvent {
    /// The document finished loading.
    Ready,
    /// Apply a change to the document; added nodes feed the mutation watcher.
    Patch(Box<dyn FnOnce(&mut Document) + Send>),
    /// A mutation signal with no document change attached.
    Mutated,
    Click { target: NodeId },
    Focus { target: NodeId },
    Input { target: NodeId, value: String },
    Submit { form: NodeId },
    /// A message from the background, with an optional reply slot.
    Message {
        message: Value,
        reply: Option<oneshot::Sender<Value>>,
    },
    /// The page is being unloaded.
    Navigate,
}

impl fmt::Debug for PageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEvent::Ready => write!(f, "Ready"),
            PageEvent::Patch(_) => write!(f, "Patch(..)"),
            PageEvent::Mutated => write!(f, "Mutated"),
            PageEvent::Click { target } => write!(f, "Click({})", target.0),
            PageEvent::Focus { target } => write!(f, "Focus({})", target.0),
            PageEvent::Input { target, .. } => write!(f, "Input({})", target.0),
            PageEvent::Submit { form } => write!(f, "Submit({})", form.0),
            PageEvent::Message { .. } => write!(f, "Message(..)"),
            PageEvent::Navigate => write!(f, "Navigate"),
        }
    }
}

/// Drives one page load.
pub struct PageSession {
    ctx: PageContext,
    orchestrator: AutofillOrchestrator,
    messenger: Arc<ContentMessenger>,
    service: Arc<dyn CredentialService>,
    scanner: FormScanner,
    watcher: MutationWatcher,
    settings: ExtensionSettings,
    pending_cycle_at: Option<Instant>,
}

impl PageSession {
    pub fn new(
        document: Document,
        settings: ExtensionSettings,
        messenger: Arc<ContentMessenger>,
        service: Arc<dyn CredentialService>,
    ) -> Result<Self, PageError> {
        Self::with_clock(document, settings, messenger, service, Arc::new(SystemClock))
    }

    pub fn with_clock(
        document: Document,
        settings: ExtensionSettings,
        messenger: Arc<ContentMessenger>,
        service: Arc<dyn CredentialService>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PageError> {
        let ctx = PageContext::new(document, &settings, clock)?;
        info!(page = %ctx.id, origin = %ctx.origin, "page session started");
        Ok(Self {
            ctx,
            orchestrator: AutofillOrchestrator::new(settings.autofill.clone()),
            messenger,
            service,
            scanner: FormScanner::new(),
            watcher: MutationWatcher::new(settings.autofill.debounce()),
            settings,
            pending_cycle_at: None,
        })
    }

    pub fn context(&self) -> &PageContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut PageContext {
        &mut self.ctx
    }

    pub fn document(&self) -> &Document {
        &self.ctx.document
    }

    pub fn orchestrator(&self) -> &AutofillOrchestrator {
        &self.orchestrator
    }

    pub fn messenger(&self) -> &ContentMessenger {
        &self.messenger
    }

    pub fn pending_cycle_at(&self) -> Option<Instant> {
        self.pending_cycle_at
    }

    /// Runs one orchestration cycle now.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.orchestrator
            .run_cycle(&mut self.ctx, &self.messenger, self.service.as_ref())
            .await
    }

    fn schedule_cycle(&mut self, now: Instant) {
        let at = now + self.settings.autofill.settle_delay();
        debug!(delay_ms = self.settings.autofill.settle_delay_ms, "orchestration cycle scheduled");
        self.pending_cycle_at = Some(at);
    }

    pub async fn handle_event(&mut self, event: PageEvent) {
        let now = Instant::now();
        match event {
            PageEvent::Ready => self.schedule_cycle(now),
            PageEvent::Patch(apply) => {
                apply(&mut self.ctx.document);
                self.watcher.observe(&mut self.ctx.document, now);
            }
            PageEvent::Mutated => self.watcher.notify(now),
            PageEvent::Click { target } => self.on_click(target, now).await,
            PageEvent::Focus { target } => self.open_picker(target, now),
            PageEvent::Input { target, value } => self.on_input(target, &value).await,
            PageEvent::Submit { form } => {
                if self.settings.save.trigger == SaveTrigger::Submit
                    && self.scanner.is_login_form(&self.ctx.document, form)
                {
                    self.offer_save(form).await;
                }
            }
            PageEvent::Message { message, reply } => {
                let response = self.on_message(message);
                if let Some(reply) = reply {
                    let _ = reply.send(response);
                }
            }
            PageEvent::Navigate => self.teardown(),
        }
    }

    async fn on_click(&mut self, target: NodeId, now: Instant) {
        if let Some(answer) = self.ctx.save_prompt.answer_for_click(&self.ctx.document, target) {
            self.answer_prompt(answer).await;
            return;
        }

        match self.ctx.picker.handle_click(&mut self.ctx.document, target, now) {
            Ok(PickerClick::Closed) | Ok(PickerClick::Dismissed) => {}
            Ok(PickerClick::Selected { .. }) | Ok(PickerClick::Ignored) => return,
            Err(e) => {
                warn!(error = %e, "picker click failed");
                return;
            }
        }

        self.open_picker(target, now);
    }

    fn open_picker(&mut self, target: NodeId, now: Instant) {
        if self.ctx.bound_credentials.is_empty() || !self.messenger.is_valid() {
            return;
        }
        let Some(binding) = self.ctx.registry.binding_for_trigger(target).copied() else {
            return;
        };
        if self.ctx.picker.panel().is_some_and(|p| p.anchor == target) {
            return;
        }
        if let Err(e) = self.ctx.picker.render(
            &mut self.ctx.document,
            &binding,
            &self.ctx.bound_credentials,
            now,
        ) {
            warn!(error = %e, "could not render credential picker");
        }
    }

    async fn on_input(&mut self, target: NodeId, value: &str) {
        if let Err(e) = self.ctx.document.set_value(target, value) {
            debug!(error = %e, "input on non-input node");
            return;
        }
        if self.settings.save.trigger != SaveTrigger::PasswordInput {
            return;
        }
        if self.ctx.document.input_type(target).as_deref() != Some("password") {
            return;
        }
        if let Some(form) = self.ctx.document.form_of(target) {
            self.offer_save(form).await;
        }
    }

    /// Offers to save the form's typed credentials. Nothing is shown unless the
    /// background reports a logged-in session.
    async fn offer_save(&mut self, form: NodeId) {
        if !self.messenger.check_login_status().await.logged_in {
            debug!("not logged in, no save prompt");
            return;
        }
        let doc = &self.ctx.document;
        let field_value = |field: Option<NodeId>| {
            field
                .and_then(|id| doc.value(id))
                .unwrap_or_default()
                .to_string()
        };
        let username = field_value(self.scanner.find_username_field(doc, form));
        let password = field_value(self.scanner.find_password_field(doc, form));
        let request = SaveRequest::new(&self.ctx.origin, &username, &password);

        match self.ctx.save_prompt.offer(&mut self.ctx.document, request) {
            Ok(true) => {}
            Ok(false) => debug!("username or password empty, no save prompt"),
            Err(e) => warn!(error = %e, "could not show save prompt"),
        }
    }

    async fn answer_prompt(&mut self, answer: PromptAnswer) {
        match answer {
            PromptAnswer::Decline => self.ctx.save_prompt.decline(&mut self.ctx.document),
            PromptAnswer::Accept => {
                let Some(request) = self.ctx.save_prompt.accept(&mut self.ctx.document) else {
                    return;
                };
                match self.messenger.save_credentials(request).await {
                    Ok(()) => {
                        info!(origin = %self.ctx.origin, "credentials saved");
                        self.ctx.cache.invalidate();
                    }
                    Err(e) => {
                        error!(origin = %self.ctx.origin, error = %e, "saving credentials failed");
                        self.ctx
                            .document
                            .alert(&format!("Failed to save credentials: {}", e));
                    }
                }
            }
        }
    }

    fn on_message(&mut self, message: Value) -> Value {
        let ack = match serde_json::from_value::<ExtensionMessage>(message) {
            Ok(ExtensionMessage::Action(ActionMessage::Autofill { credentials })) => {
                match self.ctx.fill_from_record(&credentials) {
                    Ok(()) => AckResponse::ok(),
                    Err(e) => {
                        warn!(error = %e, "autofill message could not be applied");
                        AckResponse::failed(e.to_string())
                    }
                }
            }
            Ok(other) => AckResponse::failed(format!("unsupported on page: {}", other.kind())),
            Err(e) => AckResponse::failed(format!("unknown message: {}", e)),
        };
        serde_json::to_value(ack).unwrap_or(Value::Null)
    }

    fn teardown(&mut self) {
        self.watcher.cancel();
        self.pending_cycle_at = None;
        self.ctx.teardown();
        info!(page = %self.ctx.id, "page session ended");
    }

    /// Processes events until `Navigate` or the sender is dropped.
    ///
    /// Settled mutation bursts and page-ready both start a cycle after the
    /// settle delay. While the messenger is invalid, a ping goes out on every
    /// liveness tick.
    pub async fn run(mut self, mut events: mpsc::Receiver<PageEvent>) -> Self {
        let mut liveness = interval(self.settings.messenger.liveness_interval());
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);
        liveness.tick().await;

        loop {
            let debounce_at = self.watcher.deadline();
            let cycle_at = self.pending_cycle_at;
            tokio::select! {
                event = events.recv() => match event {
                    Some(PageEvent::Navigate) | None => break,
                    Some(event) => self.handle_event(event).await,
                },
                _ = sleep_until_some(debounce_at) => {
                    let now = Instant::now();
                    if self.watcher.poll(now) {
                        self.schedule_cycle(now);
                    }
                }
                _ = sleep_until_some(cycle_at) => {
                    self.pending_cycle_at = None;
                    self.run_cycle().await;
                }
                _ = liveness.tick() => {
                    if !self.messenger.is_valid() {
                        self.messenger.ping().await;
                    }
                }
            }
        }

        self.teardown();
        self
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}

/// Routes background-to-tab traffic into page sessions over their event
/// channels.
#[derive(Default)]
pub struct ChannelTabBridge {
    pages: Mutex<HashMap<String, mpsc::Sender<PageEvent>>>,
    active: Mutex<Option<String>>,
}

impl ChannelTabBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page and makes it the active tab.
    pub fn attach(&self, url: &str, sender: mpsc::Sender<PageEvent>) {
        self.pages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), sender);
        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.to_string());
    }

    pub fn detach(&self, url: &str) {
        self.pages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(url);
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.as_deref() == Some(url) {
            *active = None;
        }
    }

    fn sender_for(&self, url: &str) -> Option<mpsc::Sender<PageEvent>> {
        self.pages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }

    fn active_sender(&self) -> Option<mpsc::Sender<PageEvent>> {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner()).clone()?;
        self.sender_for(&active)
    }

    async fn deliver(sender: mpsc::Sender<PageEvent>, message: &ExtensionMessage) -> Result<(), ChannelError> {
        let value = serde_json::to_value(message)
            .map_err(|e| ChannelError::MalformedResponse(e.to_string()))?;
        let (reply_tx, reply_rx) = oneshot::channel();
        sender
            .send(PageEvent::Message {
                message: value,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| ChannelError::Disconnected("page closed".to_string()))?;
        let reply = reply_rx
            .await
            .map_err(|_| ChannelError::Disconnected("page dropped reply".to_string()))?;
        let ack: AckResponse = serde_json::from_value(reply)
            .map_err(|e| ChannelError::MalformedResponse(e.to_string()))?;
        if ack.success {
            Ok(())
        } else {
            Err(ChannelError::Failed(
                ack.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl TabBridge for ChannelTabBridge {
    async fn fill_active_tab(&self, credentials: &CredentialRecord) -> Result<(), ChannelError> {
        let sender = self
            .active_sender()
            .ok_or_else(|| ChannelError::Disconnected("no active tab".to_string()))?;
        Self::deliver(sender, &ExtensionMessage::autofill(credentials.clone())).await
    }

    async fn send_to_tab(&self, tab_url: &str, message: ExtensionMessage) -> Result<(), ChannelError> {
        let sender = self
            .sender_for(tab_url)
            .ok_or_else(|| ChannelError::Disconnected(format!("no tab for {}", tab_url)))?;
        Self::deliver(sender, &message).await
    }
}
