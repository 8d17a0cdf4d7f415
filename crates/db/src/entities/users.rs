//! `SeaORM` Entity for users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use meridian_core::notification::Addressee;
use meridian_shared::types::{Currency, MoneyError, UserId, from_minor_units};

use super::sea_orm_active_enums::KycStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub balance_minor: i64,
    pub primary_currency: String,
    pub kyc_status: KycStatus,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::authorization_codes::Entity")]
    AuthorizationCodes,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::authorization_codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorizationCodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Typed id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.id)
    }

    /// Balance in major units.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        from_minor_units(self.balance_minor)
    }

    /// Parsed primary currency.
    pub fn currency(&self) -> Result<Currency, MoneyError> {
        self.primary_currency.parse()
    }

    /// Alert addressee for this account holder.
    #[must_use]
    pub fn addressee(&self) -> Addressee {
        Addressee {
            email: self.email.clone(),
            name: self.full_name.clone(),
        }
    }
}
