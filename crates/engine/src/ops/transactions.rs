//! Transaction listing with opaque cursor pagination (newest → older).

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, transactions};

use super::{Engine, with_tx};

/// Optional filters for transaction listing.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub type_codes: Option<Vec<String>>,
    pub state_codes: Option<Vec<String>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Cursor payload: `created_at_rfc3339|transaction_id`.
fn encode_cursor(created_at: DateTime<Utc>, id: Uuid) -> String {
    BASE64.encode(format!("{}|{}", created_at.to_rfc3339(), id))
}

fn decode_cursor(cursor: &str) -> ResultEngine<(DateTime<Utc>, String)> {
    let invalid = || EngineError::InvalidAmount("invalid cursor".to_string());

    let raw = BASE64.decode(cursor).map_err(|_| invalid())?;
    let raw = String::from_utf8(raw).map_err(|_| invalid())?;
    let (ts, id) = raw.split_once('|').ok_or_else(invalid)?;
    let ts = DateTime::parse_from_rfc3339(ts)
        .map_err(|_| invalid())?
        .with_timezone(&Utc);
    Ok((ts, id.to_string()))
}

impl Engine {
    /// Lists a wallet's transactions, newest first, with an opaque
    /// base64 cursor for fetching older pages.
    ///
    /// Only the wallet owner may list; administrative read paths go
    /// through the owner's id.
    pub async fn list_transactions(
        &self,
        wallet_id: Uuid,
        user_id: &str,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        let decoded_cursor = cursor.map(decode_cursor).transpose()?;

        with_tx!(self, |db_tx| {
            let wallet_model = self.require_wallet(&db_tx, wallet_id).await?;
            if wallet_model.user_id != user_id {
                return Err(EngineError::Forbidden(
                    "wallet belongs to another user".to_string(),
                ));
            }

            let mut query = transactions::Entity::find()
                .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit + 1);

            if let Some(type_codes) = &filter.type_codes {
                query = query.filter(transactions::Column::TypeCode.is_in(type_codes.clone()));
            }
            if let Some(state_codes) = &filter.state_codes {
                query = query.filter(transactions::Column::StateCode.is_in(state_codes.clone()));
            }
            if let Some(from) = filter.from {
                query = query.filter(transactions::Column::CreatedAt.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(transactions::Column::CreatedAt.lte(to));
            }
            if let Some((ts, id)) = &decoded_cursor {
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::CreatedAt.lt(*ts))
                        .add(
                            Condition::all()
                                .add(transactions::Column::CreatedAt.eq(*ts))
                                .add(transactions::Column::Id.lt(id.clone())),
                        ),
                );
            }

            let models = query.all(&db_tx).await?;
            let has_more = models.len() as u64 > limit;

            let mut out = Vec::with_capacity(models.len().min(limit as usize));
            for model in models.into_iter().take(limit as usize) {
                out.push(Transaction::try_from(model)?);
            }

            let next_cursor = if has_more {
                out.last().map(|tx| encode_cursor(tx.created_at, tx.id))
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }

    /// Return a single transaction. Owner only.
    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;

            let wallet_model = self
                .require_wallet(
                    &db_tx,
                    Uuid::parse_str(&model.wallet_id)
                        .map_err(|_| EngineError::WalletNotFound(model.wallet_id.clone()))?,
                )
                .await?;
            if wallet_model.user_id != user_id {
                return Err(EngineError::KeyNotFound(
                    "transaction not exists".to_string(),
                ));
            }

            Transaction::try_from(model)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trips() {
        let ts = Utc::now();
        let id = Uuid::new_v4();
        let cursor = encode_cursor(ts, id);
        let (decoded_ts, decoded_id) = decode_cursor(&cursor).unwrap();
        assert_eq!(decoded_ts, ts);
        assert_eq!(decoded_id, id.to_string());
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        assert!(decode_cursor("not base64!!").is_err());
        assert!(decode_cursor(&BASE64.encode("no separator")).is_err());
    }
}
