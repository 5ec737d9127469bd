//! In-process registry of transaction type and state codes.
//!
//! The registry is loaded once from the lookup tables when the engine is
//! built and is read-only afterwards. Mutation paths validate their
//! codes against it instead of matching on a closed enum, so a new
//! transaction kind is a seed-data migration rather than a code change.

use std::collections::HashSet;

use sea_orm::{DatabaseConnection, EntityTrait};

use crate::{EngineError, transaction_states, transaction_types};

/// Well-known codes the engine itself issues. The registry may contain
/// more; these are the ones the built-in operations reference.
pub mod codes {
    pub const RECHARGE: &str = "RECHARGE";
    pub const WITHDRAW: &str = "WITHDRAW";
    pub const TRANSFER: &str = "TRANSFER";
    pub const PURCHASE: &str = "PURCHASE";
    pub const RECYCLE: &str = "RECYCLE";
    pub const DONATION: &str = "DONATION";
    pub const BONUS: &str = "BONUS";
    pub const MINT: &str = "MINT";
    pub const DESTROY: &str = "DESTROY";
}

/// Transaction lifecycle states seeded by the migrations.
pub mod states {
    pub const PENDING: &str = "PENDING";
    pub const COMPLETED: &str = "COMPLETED";
    pub const FAILED: &str = "FAILED";
    pub const CANCELLED: &str = "CANCELLED";

    /// Terminal states never transition again.
    pub fn is_terminal(code: &str) -> bool {
        matches!(code, COMPLETED | FAILED | CANCELLED)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
    types: HashSet<String>,
    states: HashSet<String>,
}

impl Registry {
    /// Loads every known type/state code from the lookup tables.
    pub async fn load(db: &DatabaseConnection) -> Result<Self, EngineError> {
        let types = transaction_types::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.code)
            .collect();
        let states = transaction_states::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.code)
            .collect();
        Ok(Self { types, states })
    }

    #[must_use]
    pub fn from_codes<T, S>(types: T, states: S) -> Self
    where
        T: IntoIterator<Item = String>,
        S: IntoIterator<Item = String>,
    {
        Self {
            types: types.into_iter().collect(),
            states: states.into_iter().collect(),
        }
    }

    pub fn require_type(&self, code: &str) -> Result<(), EngineError> {
        if self.types.contains(code) {
            Ok(())
        } else {
            Err(EngineError::TransactionTypeUnknown(code.to_string()))
        }
    }

    pub fn require_state(&self, code: &str) -> Result<(), EngineError> {
        if self.states.contains(code) {
            Ok(())
        } else {
            Err(EngineError::InvalidState(format!(
                "unknown transaction state: {code}"
            )))
        }
    }

    #[must_use]
    pub fn type_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.types.iter().cloned().collect();
        codes.sort();
        codes
    }

    #[must_use]
    pub fn state_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.states.iter().cloned().collect();
        codes.sort();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::from_codes(
            [codes::RECHARGE.to_string(), codes::PURCHASE.to_string()],
            [states::PENDING.to_string(), states::COMPLETED.to_string()],
        )
    }

    #[test]
    fn known_codes_pass() {
        let registry = registry();
        assert!(registry.require_type(codes::RECHARGE).is_ok());
        assert!(registry.require_state(states::PENDING).is_ok());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let registry = registry();
        assert_eq!(
            registry.require_type("AIRDROP"),
            Err(EngineError::TransactionTypeUnknown("AIRDROP".to_string()))
        );
    }

    #[test]
    fn terminal_states() {
        assert!(states::is_terminal(states::COMPLETED));
        assert!(states::is_terminal(states::FAILED));
        assert!(!states::is_terminal(states::PENDING));
    }
}
