//! Command structs for engine operations.
//!
//! These types group parameters for write operations (credit/debit/
//! transfer/checkout/mint), keeping call sites readable and avoiding
//! long argument lists.

use uuid::Uuid;

use crate::{AdminOperation, BalanceKind, Grams, Money, registry::codes};

/// Credit a wallet.
#[derive(Clone, Debug)]
pub struct CreditCmd {
    pub wallet_id: Uuid,
    pub amount: Money,
    pub balance: BalanceKind,
    pub type_code: String,
    pub note: Option<String>,
    pub created_by: String,
}

impl CreditCmd {
    #[must_use]
    pub fn new(wallet_id: Uuid, amount: Money, created_by: impl Into<String>) -> Self {
        Self {
            wallet_id,
            amount,
            balance: BalanceKind::Becoin,
            type_code: codes::RECHARGE.to_string(),
            note: None,
            created_by: created_by.into(),
        }
    }

    #[must_use]
    pub fn balance(mut self, balance: BalanceKind) -> Self {
        self.balance = balance;
        self
    }

    #[must_use]
    pub fn type_code(mut self, type_code: impl Into<String>) -> Self {
        self.type_code = type_code.into();
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Debit a wallet.
#[derive(Clone, Debug)]
pub struct DebitCmd {
    pub wallet_id: Uuid,
    pub amount: Money,
    pub balance: BalanceKind,
    pub type_code: String,
    pub note: Option<String>,
    pub created_by: String,
}

impl DebitCmd {
    #[must_use]
    pub fn new(wallet_id: Uuid, amount: Money, created_by: impl Into<String>) -> Self {
        Self {
            wallet_id,
            amount,
            balance: BalanceKind::Becoin,
            type_code: codes::WITHDRAW.to_string(),
            note: None,
            created_by: created_by.into(),
        }
    }

    #[must_use]
    pub fn balance(mut self, balance: BalanceKind) -> Self {
        self.balance = balance;
        self
    }

    #[must_use]
    pub fn type_code(mut self, type_code: impl Into<String>) -> Self {
        self.type_code = type_code.into();
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Move becoin between two wallets as a single unit of work.
///
/// `type_code` defaults to `TRANSFER`; donations are the same movement
/// recorded under the `DONATION` code.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    pub amount: Money,
    pub balance: BalanceKind,
    pub type_code: String,
    pub note: Option<String>,
    pub created_by: String,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_wallet_id: Uuid,
        to_wallet_id: Uuid,
        amount: Money,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            from_wallet_id,
            to_wallet_id,
            amount,
            balance: BalanceKind::Becoin,
            type_code: codes::TRANSFER.to_string(),
            note: None,
            created_by: created_by.into(),
        }
    }

    #[must_use]
    pub fn balance(mut self, balance: BalanceKind) -> Self {
        self.balance = balance;
        self
    }

    #[must_use]
    pub fn type_code(mut self, type_code: impl Into<String>) -> Self {
        self.type_code = type_code.into();
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Add a line item to a user's cart.
#[derive(Clone, Debug)]
pub struct AddCartItemCmd {
    pub user_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_becoin: Money,
    pub unit_weight: Grams,
    pub recycled: bool,
}

impl AddCartItemCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, quantity: i64) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            quantity,
            unit_price: Money::ZERO,
            unit_becoin: Money::ZERO,
            unit_weight: Grams::ZERO,
            recycled: false,
        }
    }

    #[must_use]
    pub fn unit_price(mut self, unit_price: Money) -> Self {
        self.unit_price = unit_price;
        self
    }

    #[must_use]
    pub fn unit_becoin(mut self, unit_becoin: Money) -> Self {
        self.unit_becoin = unit_becoin;
        self
    }

    #[must_use]
    pub fn unit_weight(mut self, unit_weight: Grams) -> Self {
        self.unit_weight = unit_weight;
        self
    }

    #[must_use]
    pub fn recycled(mut self, recycled: bool) -> Self {
        self.recycled = recycled;
        self
    }
}

/// Settle a user's cart into an order.
#[derive(Clone, Debug)]
pub struct CheckoutCmd {
    pub user_id: String,
    pub payment_type_code: String,
    pub coupon_code: Option<String>,
    pub observation: Option<String>,
}

impl CheckoutCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, payment_type_code: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            payment_type_code: payment_type_code.into(),
            coupon_code: None,
            observation: None,
        }
    }

    #[must_use]
    pub fn coupon_code(mut self, code: impl Into<String>) -> Self {
        self.coupon_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = Some(observation.into());
        self
    }
}

/// Administrative supply operation against the system wallet.
#[derive(Clone, Debug)]
pub struct AdminMintCmd {
    pub operation: AdminOperation,
    pub amount: Money,
    pub note: Option<String>,
    pub created_by: String,
}

impl AdminMintCmd {
    #[must_use]
    pub fn new(operation: AdminOperation, amount: Money, created_by: impl Into<String>) -> Self {
        Self {
            operation,
            amount,
            note: None,
            created_by: created_by.into(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
