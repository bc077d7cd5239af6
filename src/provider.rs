//! Runs a [`SummaryController`] on a single task and hands out
//! [`SummaryHandle`]s to consumers.
//!
//! The loop reacts to exactly three inputs: consumer commands, inbound channel
//! events, and extension context changes.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::catalog::{Catalog, Model, Prompt};
use crate::error::SummaryError;
use crate::port::Port;
use crate::state::{ControllerPolicy, SummaryController, SummaryObserver, SummarySnapshot};
use crate::types::{ExtensionContext, PortData};

/// The UI event that triggered a generation. Form submissions must not fall
/// through to their default action.
pub trait TriggerEvent {
    fn prevent_default(&mut self);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubmitEvent {
    pub default_prevented: bool,
}

impl TriggerEvent for SubmitEvent {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

#[derive(Debug)]
pub enum ProviderCommand {
    Generate,
    SetModel(Model),
    SetPrompt(Prompt),
    SetContent(Option<String>),
    SetError(bool),
    SetGenerating(bool),
}

/// Consumer-facing surface: the current state, setters and the trigger.
#[derive(Clone)]
pub struct SummaryHandle {
    commands: mpsc::UnboundedSender<ProviderCommand>,
    state: watch::Receiver<SummarySnapshot>,
}

impl SummaryHandle {
    pub fn generate_summary(&self, event: &mut dyn TriggerEvent) -> Result<(), SummaryError> {
        event.prevent_default();
        self.command(ProviderCommand::Generate)
    }

    pub fn set_model(&self, model: Model) -> Result<(), SummaryError> {
        self.command(ProviderCommand::SetModel(model))
    }

    pub fn set_prompt(&self, prompt: Prompt) -> Result<(), SummaryError> {
        self.command(ProviderCommand::SetPrompt(prompt))
    }

    pub fn set_content(&self, content: Option<String>) -> Result<(), SummaryError> {
        self.command(ProviderCommand::SetContent(content))
    }

    pub fn set_error(&self, is_error: bool) -> Result<(), SummaryError> {
        self.command(ProviderCommand::SetError(is_error))
    }

    pub fn set_generating(&self, is_generating: bool) -> Result<(), SummaryError> {
        self.command(ProviderCommand::SetGenerating(is_generating))
    }

    pub fn snapshot(&self) -> SummarySnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SummarySnapshot> {
        self.state.clone()
    }

    fn command(&self, command: ProviderCommand) -> Result<(), SummaryError> {
        self.commands
            .send(command)
            .map_err(|_| SummaryError::ProviderClosed)
    }
}

/// The slice of a consumer tree a component can see. Components rendered
/// under a provider get a scope carrying its handle.
#[derive(Clone, Default)]
pub struct ProviderScope {
    summary: Option<SummaryHandle>,
}

impl ProviderScope {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn with_summary(handle: SummaryHandle) -> Self {
        Self {
            summary: Some(handle),
        }
    }

    pub fn use_summary(&self) -> Result<&SummaryHandle, SummaryError> {
        self.summary.as_ref().ok_or(SummaryError::OutsideProvider)
    }
}

pub struct SummaryProvider<P: Port> {
    controller: SummaryController<P>,
    inbound: mpsc::UnboundedReceiver<PortData>,
    extension: watch::Receiver<ExtensionContext>,
    commands: mpsc::UnboundedReceiver<ProviderCommand>,
}

impl<P: Port> SummaryProvider<P> {
    pub fn new(
        catalog: &Catalog,
        port: P,
        inbound: mpsc::UnboundedReceiver<PortData>,
        extension: watch::Receiver<ExtensionContext>,
        policy: ControllerPolicy,
    ) -> (Self, SummaryHandle) {
        let initial = extension.borrow().clone();
        let controller = SummaryController::new(catalog, port, initial, policy);
        let (command_tx, commands) = mpsc::unbounded_channel();
        let handle = SummaryHandle {
            commands: command_tx,
            state: controller.subscribe(),
        };

        (
            Self {
                controller,
                inbound,
                extension,
                commands,
            },
            handle,
        )
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SummaryObserver>) {
        self.controller.add_observer(observer);
    }

    /// Runs until every handle is dropped or the channel closes. Returns the
    /// final state.
    pub async fn run(mut self) -> SummarySnapshot {
        let mut extension_open = true;
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                data = self.inbound.recv() => match data {
                    Some(data) => {
                        let transitions = self.controller.on_port_data(data);
                        debug!(?transitions, "channel event applied");
                    }
                    None => break,
                },
                changed = self.extension.changed(), if extension_open => {
                    if changed.is_err() {
                        extension_open = false;
                        continue;
                    }
                    let next = self.extension.borrow_and_update().clone();
                    if let Some(transition) = self.controller.on_extension_changed(next) {
                        debug!(?transition, "extension context changed");
                    }
                }
            }
        }

        debug!("summary provider stopped");
        self.controller.snapshot().clone()
    }

    fn apply(&mut self, command: ProviderCommand) {
        match command {
            ProviderCommand::Generate => {
                self.controller.generate();
            }
            ProviderCommand::SetModel(model) => self.controller.set_model(model),
            ProviderCommand::SetPrompt(prompt) => self.controller.set_prompt(prompt),
            ProviderCommand::SetContent(content) => self.controller.set_content(content),
            ProviderCommand::SetError(is_error) => self.controller.set_error(is_error),
            ProviderCommand::SetGenerating(is_generating) => {
                self.controller.set_generating(is_generating)
            }
        }
    }
}
