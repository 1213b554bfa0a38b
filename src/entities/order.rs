use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A customer order. `total_amount` is always the sum of the line totals of
/// its items and is recomputed whenever the items change; it is never
/// accepted from the client.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Identifier assigned by 1C once the order has been accepted remotely
    #[sea_orm(unique)]
    pub onec_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub customer_info: Option<String>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Order lifecycle status. Stored as lowercase text.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Human-readable label, surfaced as `status_display` in API responses.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Canceled => "Canceled",
        }
    }

}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now().naive_utc();
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = sea_orm::Set(now);
            }
        } else {
            self.updated_at = sea_orm::Set(Some(now));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Shipped).unwrap(),
            "\"shipped\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(parsed, OrderStatus::Processing);
        assert!(serde_json::from_str::<OrderStatus>("\"bogus\"").is_err());
    }

    #[test]
    fn status_labels() {
        assert_eq!(OrderStatus::New.label(), "New");
        assert_eq!(OrderStatus::Canceled.label(), "Canceled");
    }
}
