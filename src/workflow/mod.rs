pub mod authz;
pub mod engine;
pub mod error;
pub mod events;
pub mod numbers;

pub use engine::{
    Decision, RequestDraft, RequestItemDraft, RequestRevision, ShipmentFields, SupplierResponse,
    WorkflowEngine,
};
pub use error::WorkflowError;
pub use events::{EntityKind, TracingListener, TransitionEvent, TransitionListener};
