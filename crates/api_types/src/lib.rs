use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        /// Balances in minor units (hundredths of a becoin).
        pub becoin_minor: i64,
        pub becoin_green_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RechargeNew {
        /// Amount in minor units, > 0.
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawNew {
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub to_wallet_id: Uuid,
        pub amount_minor: i64,
        pub note: Option<String>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
        pub type_codes: Option<Vec<String>>,
        pub state_codes: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub type_code: String,
        pub state_code: String,
        pub balance: String,
        pub direction: String,
        pub amount_minor: i64,
        pub related_wallet_id: Option<Uuid>,
        pub order_id: Option<Uuid>,
        pub note: Option<String>,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}

pub mod cart {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CartItemNew {
        pub name: String,
        pub quantity: i64,
        pub unit_price_minor: i64,
        pub unit_becoin_minor: i64,
        pub unit_weight_grams: i64,
        pub recycled: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CartItemUpdate {
        pub quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CartItemView {
        pub id: Uuid,
        pub name: String,
        pub quantity: i64,
        pub unit_price_minor: i64,
        pub unit_becoin_minor: i64,
        pub unit_weight_grams: i64,
        pub recycled: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CartView {
        pub id: Uuid,
        pub total_amount_minor: i64,
        pub total_items: i64,
        pub total_becoin_minor: i64,
        pub total_weight_grams: i64,
        pub total_weight_recycled_grams: i64,
        pub items: Vec<CartItemView>,
    }
}

pub mod order {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckoutNew {
        pub payment_type_code: String,
        pub coupon_code: Option<String>,
        pub observation: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderItemView {
        pub name: String,
        pub quantity: i64,
        pub unit_price_minor: i64,
        pub unit_becoin_minor: i64,
        pub unit_weight_grams: i64,
        pub recycled: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderView {
        pub id: Uuid,
        pub code: String,
        pub payment_type_code: String,
        pub status_code: String,
        pub total_amount_minor: i64,
        pub total_items: i64,
        pub total_becoin_minor: i64,
        pub total_weight_grams: i64,
        pub total_weight_recycled_grams: i64,
        pub discount_minor: i64,
        pub observation: Option<String>,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
        pub items: Option<Vec<OrderItemView>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderListResponse {
        pub orders: Vec<OrderView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentResult {
        pub order_id: Uuid,
        pub succeeded: bool,
        pub external_reference: Option<String>,
    }
}

pub mod coupon {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CouponValidate {
        pub code: String,
        pub purchase_total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CouponValidateResponse {
        pub discount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CouponRedeem {
        pub code: String,
    }
}

pub mod admin {
    use super::*;

    /// `operation` is `CREATE` or `DESTROY`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BecoinSupplyOp {
        pub operation: String,
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BecoinSupplyResponse {
        pub transaction_id: Uuid,
        pub system_becoin_minor: i64,
    }
}
