use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::store::{SummaryObserver, SummarySnapshot, SummaryStore};
use crate::catalog::{Catalog, Model, Prompt};
use crate::port::Port;
use crate::types::{ExtensionContext, PortData, SummaryRequest};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerPolicy {
    /// When false (the default) an error event leaves the generating flag as
    /// the trigger set it.
    pub end_generation_on_error: bool,
}

/// What a single input did to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Started { generation: u64 },
    PartialUpdate,
    StreamEnded,
    Failed { generating_retained: bool },
    ErrorCleared,
    Discarded { generation: u64 },
    Reset,
}

pub struct SummaryController<P: Port> {
    store: SummaryStore,
    port: P,
    extension: ExtensionContext,
    policy: ControllerPolicy,
    next_generation: u64,
    active_generation: Option<u64>,
    error_observed: bool,
}

impl<P: Port> SummaryController<P> {
    pub fn new(
        catalog: &Catalog,
        port: P,
        extension: ExtensionContext,
        policy: ControllerPolicy,
    ) -> Self {
        Self {
            store: SummaryStore::new(
                catalog.default_model().clone(),
                catalog.default_prompt().clone(),
            ),
            port,
            extension,
            policy,
            next_generation: 1,
            active_generation: None,
            error_observed: false,
        }
    }

    pub fn snapshot(&self) -> &SummarySnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SummarySnapshot> {
        self.store.subscribe()
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SummaryObserver>) {
        self.store.add_observer(observer);
    }

    pub fn active_generation(&self) -> Option<u64> {
        self.active_generation
    }

    pub fn extension(&self) -> &ExtensionContext {
        &self.extension
    }

    /// Starts a new generation. Any content from a previous one is cleared
    /// before the request leaves, and the previous generation's late events
    /// are discarded from here on.
    pub fn generate(&mut self) -> Transition {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.active_generation = Some(generation);
        self.error_observed = false;

        if self.store.snapshot().content.is_some() {
            self.store.set_content(None);
        }
        self.store.set_error(false);
        self.store.set_generating(true);

        let snapshot = self.store.snapshot();
        let request = SummaryRequest {
            prompt: snapshot.prompt.content.clone(),
            model: snapshot.model.content.clone(),
            context: self.extension.data.clone(),
            generation_id: generation,
        };
        info!(generation, model = %request.model, "summary generation started");
        self.port.send(request);

        Transition::Started { generation }
    }

    /// Applies one inbound channel event. The message observation runs first,
    /// then the error observation; both may fire for the same event.
    pub fn on_port_data(&mut self, data: PortData) -> Vec<Transition> {
        if let Some(generation) = data.generation_id {
            if self.active_generation != Some(generation) {
                debug!(
                    generation,
                    active = ?self.active_generation,
                    "discarding event from superseded generation"
                );
                return vec![Transition::Discarded { generation }];
            }
        }

        let mut transitions = Vec::with_capacity(2);

        if !data.is_error_only() {
            if let Some(message) = data.partial_message() {
                self.store.set_content(Some(message.to_string()));
                self.store.set_error(false);
                transitions.push(Transition::PartialUpdate);
            } else {
                self.store.set_generating(false);
                self.store.set_error(false);
                debug!(generation = ?self.active_generation, "summary stream ended");
                transitions.push(Transition::StreamEnded);
            }
        }

        match data.error_value() {
            Some(error) => {
                warn!(generation = ?self.active_generation, %error, "summary generation failed");
                self.store.set_content(None);
                self.store.set_error(true);
                if self.policy.end_generation_on_error {
                    self.store.set_generating(false);
                }
                self.error_observed = true;
                transitions.push(Transition::Failed {
                    generating_retained: !self.policy.end_generation_on_error,
                });
            }
            None if self.error_observed => {
                self.store.set_error(false);
                self.error_observed = false;
                transitions.push(Transition::ErrorCleared);
            }
            None => {}
        }

        transitions
    }

    /// Resets content, error and generating whenever the loading indicator
    /// flips. The data is always replaced so the next trigger reads it.
    pub fn on_extension_changed(&mut self, next: ExtensionContext) -> Option<Transition> {
        let loading_changed = next.loading != self.extension.loading;
        self.extension = next;
        if !loading_changed {
            return None;
        }

        if let Some(generation) = self.active_generation.take() {
            debug!(generation, "abandoning generation after extension change");
        }
        self.error_observed = false;
        self.store.reset_generation();
        Some(Transition::Reset)
    }

    pub fn set_model(&mut self, model: Model) {
        self.store.set_model(model);
    }

    pub fn set_prompt(&mut self, prompt: Prompt) {
        self.store.set_prompt(prompt);
    }

    pub fn set_content(&mut self, content: Option<String>) {
        self.store.set_content(content);
    }

    pub fn set_error(&mut self, is_error: bool) {
        self.store.set_error(is_error);
    }

    pub fn set_generating(&mut self, is_generating: bool) {
        self.store.set_generating(is_generating);
    }
}
