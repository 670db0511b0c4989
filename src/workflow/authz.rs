//! Authorization gate: pure role/ownership checks, no I/O.
//!
//! Every engine command consults one of these before touching the store, so
//! a denied actor is rejected identically no matter what state the entity is
//! in. Authorization failures are always distinct from state-machine and
//! validation failures.

use crate::models::{Actor, Role, SupplyRequest};
use crate::store::ReadScope;

use super::error::WorkflowError;

/// Only a branch actor may submit; the request is always filed for the
/// branch the actor belongs to.
pub fn submitting_branch(actor: &Actor) -> Result<i64, WorkflowError> {
    match actor.role {
        Role::Branch { branch_id } => Ok(branch_id),
        _ => Err(WorkflowError::authorization(
            "only branch users can submit supply requests",
        )),
    }
}

/// Only admins decide pending requests.
pub fn require_admin(actor: &Actor) -> Result<(), WorkflowError> {
    match actor.role {
        Role::Admin => Ok(()),
        _ => Err(WorkflowError::authorization(
            "only admins can decide supply requests",
        )),
    }
}

/// Supplier commands: returns the supplier identity the actor acts for.
pub fn acting_supplier(actor: &Actor) -> Result<i64, WorkflowError> {
    match actor.role {
        Role::Supplier { supplier_id } => Ok(supplier_id),
        _ => Err(WorkflowError::authorization(
            "only supplier users can perform this action",
        )),
    }
}

/// Branch commands on an existing request: the actor must belong to the
/// request's originating branch.
pub fn require_request_branch(
    actor: &Actor,
    request: &SupplyRequest,
) -> Result<(), WorkflowError> {
    match actor.role {
        Role::Branch { branch_id } if branch_id == request.branch_id => Ok(()),
        Role::Branch { .. } => Err(WorkflowError::authorization(
            "request belongs to a different branch",
        )),
        _ => Err(WorkflowError::authorization(
            "only the originating branch can perform this action",
        )),
    }
}

/// Supplier ownership check against an order/shipment party.
pub fn require_supplier_identity(
    actor: &Actor,
    supplier_id: i64,
) -> Result<(), WorkflowError> {
    match actor.role {
        Role::Supplier { supplier_id: own } if own == supplier_id => Ok(()),
        Role::Supplier { .. } => Err(WorkflowError::authorization(
            "order belongs to a different supplier",
        )),
        _ => Err(WorkflowError::authorization(
            "only supplier users can perform this action",
        )),
    }
}

/// Read visibility: admins see everything, branches and suppliers only what
/// they are a party to.
pub fn read_scope(actor: &Actor) -> ReadScope {
    match actor.role {
        Role::Admin => ReadScope::All,
        Role::Branch { branch_id } => ReadScope::Branch(branch_id),
        Role::Supplier { supplier_id } => ReadScope::Supplier(supplier_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_decides() {
        assert!(require_admin(&Actor::admin(1)).is_ok());
        assert!(matches!(
            require_admin(&Actor::supplier(2, 7)),
            Err(WorkflowError::Authorization(_))
        ));
        assert!(matches!(
            require_admin(&Actor::branch(3, 4)),
            Err(WorkflowError::Authorization(_))
        ));
    }

    #[test]
    fn only_branch_submits_for_itself() {
        assert_eq!(submitting_branch(&Actor::branch(1, 42)).unwrap(), 42);
        assert!(submitting_branch(&Actor::admin(1)).is_err());
        assert!(submitting_branch(&Actor::supplier(1, 9)).is_err());
    }

    #[test]
    fn supplier_identity_must_match() {
        assert!(require_supplier_identity(&Actor::supplier(1, 5), 5).is_ok());
        assert!(require_supplier_identity(&Actor::supplier(1, 5), 6).is_err());
        assert!(require_supplier_identity(&Actor::admin(1), 5).is_err());
    }

    #[test]
    fn scopes_follow_role() {
        assert_eq!(read_scope(&Actor::admin(1)), ReadScope::All);
        assert_eq!(read_scope(&Actor::branch(1, 3)), ReadScope::Branch(3));
        assert_eq!(read_scope(&Actor::supplier(1, 8)), ReadScope::Supplier(8));
    }
}
