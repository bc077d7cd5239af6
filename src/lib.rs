//! State coordination for streamed summary generation.
//!
//! A [`SummaryProvider`] owns the observable summary state and a single
//! completion channel. Consumers hold a [`SummaryHandle`] to read state,
//! change the selection and trigger generations; a [`CompletionWorker`] on the
//! other end of a [`ChannelPort`] streams the results back.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod port;
pub mod provider;
pub mod state;
pub mod types;
pub mod util;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use catalog::{Catalog, Model, Prompt};
pub use config::Config;
pub use error::SummaryError;
pub use port::{ChannelPort, Port, PortEndpoint};
pub use provider::{ProviderScope, SubmitEvent, SummaryHandle, SummaryProvider, TriggerEvent};
pub use state::{
    ControllerPolicy, StateChange, SummaryController, SummaryObserver, SummaryPhase,
    SummarySnapshot, Transition,
};
pub use types::{ExtensionContext, PortData, SummaryRequest};
pub use worker::CompletionWorker;
