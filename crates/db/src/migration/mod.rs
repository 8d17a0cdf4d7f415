//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20261019_000001_users;
mod m20261019_000002_transactions;
mod m20261019_000003_authorization_codes;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_users::Migration),
            Box::new(m20261019_000002_transactions::Migration),
            Box::new(m20261019_000003_authorization_codes::Migration),
        ]
    }
}
