use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub sku: String,
    #[sea_orm(column_type = "Decimal(None)")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub discount: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub categories: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Json,
    pub stock: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
