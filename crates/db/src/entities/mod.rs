//! `SeaORM` entities.

pub mod authorization_codes;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
