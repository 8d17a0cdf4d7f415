//! `SeaORM` Entity for authorization_codes table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use meridian_core::authorization::CodeRecord;
use meridian_shared::types::{AuthorizationCodeId, UserId};

use super::sea_orm_active_enums::CodeType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "authorization_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub code_type: CodeType,
    pub user_id: Option<Uuid>,
    pub is_used: bool,
    pub used_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub expires_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for CodeRecord {
    fn from(model: &Model) -> Self {
        Self {
            id: AuthorizationCodeId::from_uuid(model.id),
            code_type: model.code_type.into(),
            user_id: model.user_id.map(UserId::from_uuid),
            is_used: model.is_used,
            expires_at: model.expires_at.map(|at| at.to_utc()),
        }
    }
}
