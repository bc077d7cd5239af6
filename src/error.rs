#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("{0} catalog must contain at least one entry")]
    EmptyCatalog(&'static str),
    #[error("summary handle requested outside of a summary provider")]
    OutsideProvider,
    #[error("summary provider has shut down")]
    ProviderClosed,
    #[error("failed to load extension context: {0}")]
    Context(String),
}
