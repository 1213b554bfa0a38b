use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A sellable product, optionally correlated with a 1C catalog entry via
/// `onec_id` (the remote identifier) or `article` (the SKU-style code).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Identifier assigned by 1C; `None` for locally created products
    #[sea_orm(unique)]
    pub onec_id: Option<String>,
    /// Article (SKU) code, unique when present
    #[sea_orm(unique)]
    pub article: Option<String>,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
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
