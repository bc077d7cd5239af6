mod controller;
mod store;


pub use controller::{ControllerPolicy, SummaryController, Transition};
pub use store::{StateChange, SummaryObserver, SummaryPhase, SummarySnapshot, SummaryStore};
