//! Transition events emitted to audit/notification collaborators.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Request,
    Order,
    Shipment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Request => "supply_request",
            EntityKind::Order => "order",
            EntityKind::Shipment => "shipment",
        }
    }
}

/// One successful transition. `from` is `None` for entity creation.
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    pub entity: EntityKind,
    pub entity_id: i64,
    pub from: Option<&'static str>,
    pub to: &'static str,
    pub actor_id: i64,
    pub actor_role: &'static str,
    pub at: DateTime<Utc>,
}

/// Callback invoked after every successful transition. Listeners run inline
/// on the command path and must not block; anything heavier belongs behind a
/// channel owned by the listener.
pub trait TransitionListener: Send + Sync {
    fn on_transition(&self, event: &TransitionEvent);
}

/// Default listener: structured log line per transition.
pub struct TracingListener;

impl TransitionListener for TracingListener {
    fn on_transition(&self, event: &TransitionEvent) {
        tracing::info!(
            entity = event.entity.as_str(),
            entity_id = event.entity_id,
            from = event.from.unwrap_or("-"),
            to = event.to,
            actor_id = event.actor_id,
            actor_role = event.actor_role,
            "workflow transition"
        );
    }
}
