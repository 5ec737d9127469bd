//! Administrative becoin supply ledger.
//!
//! Every system-level creation or destruction of becoin supply is
//! recorded here, tied 1:1 to the transaction that moved the balance on
//! the system wallet.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminOperation {
    Create,
    Destroy,
}

impl AdminOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Destroy => "DESTROY",
        }
    }
}

impl TryFrom<&str> for AdminOperation {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CREATE" => Ok(Self::Create),
            "DESTROY" => Ok(Self::Destroy),
            other => Err(EngineError::InvalidState(format!(
                "invalid admin operation: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminBecoin {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub operation: AdminOperation,
    pub amount: Money,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "admin_becoins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub operation_type: String,
    pub amount_minor: i64,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AdminBecoin> for ActiveModel {
    fn from(row: &AdminBecoin) -> Self {
        Self {
            id: ActiveValue::Set(row.id.to_string()),
            transaction_id: ActiveValue::Set(row.transaction_id.to_string()),
            operation_type: ActiveValue::Set(row.operation.as_str().to_string()),
            amount_minor: ActiveValue::Set(row.amount.minor()),
            created_by: ActiveValue::Set(row.created_by.clone()),
            created_at: ActiveValue::Set(row.created_at),
        }
    }
}

impl TryFrom<Model> for AdminBecoin {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("admin becoin not exists".to_string()))?,
            transaction_id: Uuid::parse_str(&model.transaction_id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            operation: AdminOperation::try_from(model.operation_type.as_str())?,
            amount: Money::new(model.amount_minor),
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
