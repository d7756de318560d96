use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::ticket::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    QuotesCreate,
    QuotesUpdate,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuotesCreate => "quotes_create",
            Self::QuotesUpdate => "quotes_update",
        }
    }
}

/// The caller's resolved capabilities, passed into every lifecycle operation
/// and checked once at the top. Building this value from the role store is
/// the request layer's job; the engine only reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionContext {
    pub acting_user: UserId,
    capabilities: HashSet<Capability>,
}

impl PermissionContext {
    pub fn new(acting_user: UserId, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self { acting_user, capabilities: capabilities.into_iter().collect() }
    }

    /// A context with no capabilities; read-only operations still work.
    pub fn read_only(acting_user: UserId) -> Self {
        Self { acting_user, capabilities: HashSet::new() }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::ticket::UserId;

    use super::{Capability, PermissionContext};

    #[test]
    fn granted_capability_is_allowed() {
        let context =
            PermissionContext::new(UserId("u-1".to_string()), [Capability::QuotesCreate]);
        assert!(context.allows(Capability::QuotesCreate));
        assert!(!context.allows(Capability::QuotesUpdate));
    }

    #[test]
    fn read_only_context_allows_nothing() {
        let context = PermissionContext::read_only(UserId("u-1".to_string()));
        assert!(!context.allows(Capability::QuotesCreate));
        assert!(!context.allows(Capability::QuotesUpdate));
    }
}
