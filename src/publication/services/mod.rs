//! Application services driving publication tasks.

mod dispatch;
mod pipeline;
mod recipients;

pub use dispatch::{DispatchError, DispatchReport, DispatchRequest, Dispatcher};
pub use pipeline::{
    ClaimFailure, ClaimReport, ProcessingPhase, PublicationError, PublicationPipeline,
    PublicationPorts, PublicationResult, RunSummary, TaskOutcome,
};
pub use recipients::RecipientResolver;
