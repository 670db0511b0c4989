use serde::{Deserialize, Serialize};

/// Closed set of roles. Branch and supplier actors carry the identity of the
/// party they act for; there is no role without an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Admin,
    Branch { branch_id: i64 },
    Supplier { supplier_id: i64 },
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Branch { .. } => "branch",
            Role::Supplier { .. } => "supplier",
        }
    }
}

/// An authenticated caller. Every workflow operation takes an `Actor`
/// explicitly; nothing reads identity from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn admin(user_id: i64) -> Self {
        Actor { user_id, role: Role::Admin }
    }

    pub fn branch(user_id: i64, branch_id: i64) -> Self {
        Actor { user_id, role: Role::Branch { branch_id } }
    }

    pub fn supplier(user_id: i64, supplier_id: i64) -> Self {
        Actor { user_id, role: Role::Supplier { supplier_id } }
    }
}
