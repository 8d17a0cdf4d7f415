//! Database seeder for Meridian development.
//!
//! Creates demo accounts and a fresh set of authorization codes. Existing
//! accounts are left untouched, so the seeder can be re-run to get new codes.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meridian_core::account::KycStatus;
use meridian_core::authorization::AuthorizationType;
use meridian_db::entities::users;
use meridian_db::migration::Migrator;
use meridian_db::{AccountRepository, AuthorizationCodeRepository, NewAccount, connect};
use meridian_shared::AppConfig;
use meridian_shared::types::Currency;

/// Lifetime of seeded authorization codes.
const CODE_TTL_HOURS: i64 = 24;

struct DemoAccount {
    email: &'static str,
    full_name: &'static str,
    kyc_status: KycStatus,
    opening_balance: Decimal,
}

const DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        email: "jane@meridian.dev",
        full_name: "Jane Holder",
        kyc_status: KycStatus::Verified,
        opening_balance: dec!(5000.00),
    },
    DemoAccount {
        email: "sam@meridian.dev",
        full_name: "Sam Pending",
        kyc_status: KycStatus::Submitted,
        opening_balance: dec!(250.00),
    },
    DemoAccount {
        email: "lee@meridian.dev",
        full_name: "Lee Empty",
        kyc_status: KycStatus::Verified,
        opening_balance: dec!(0.00),
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    for demo in &DEMO_ACCOUNTS {
        let account = seed_account(&db, demo).await?;
        seed_codes(&db, &account).await?;
    }

    // Unscoped codes usable by any account
    seed_codes_for(&db, None, "shared").await?;

    info!("Seeding complete");
    Ok(())
}

async fn seed_account(db: &DatabaseConnection, demo: &DemoAccount) -> anyhow::Result<users::Model> {
    let accounts = AccountRepository::new(db.clone());
    if let Some(existing) = accounts.find_by_email(demo.email).await? {
        info!(email = demo.email, "Account already exists, skipping");
        return Ok(existing);
    }

    let account = accounts
        .create(NewAccount {
            email: demo.email.to_string(),
            full_name: demo.full_name.to_string(),
            primary_currency: Currency::Usd,
            kyc_status: demo.kyc_status,
            opening_balance: demo.opening_balance,
        })
        .await
        .with_context(|| format!("Failed to create {}", demo.email))?;
    info!(
        email = demo.email,
        kyc_status = %demo.kyc_status,
        balance = %demo.opening_balance,
        "Created demo account"
    );
    Ok(account)
}

async fn seed_codes(db: &DatabaseConnection, account: &users::Model) -> anyhow::Result<()> {
    seed_codes_for(db, Some(account), &account.email).await
}

async fn seed_codes_for(
    db: &DatabaseConnection,
    owner: Option<&users::Model>,
    label: &str,
) -> anyhow::Result<()> {
    let codes = AuthorizationCodeRepository::new(db.clone());
    for code_type in AuthorizationType::ALL {
        let issued = codes
            .issue(
                code_type,
                owner.map(users::Model::user_id),
                Some(Duration::hours(CODE_TTL_HOURS)),
            )
            .await
            .with_context(|| format!("Failed to issue {code_type} code"))?;
        info!(owner = label, code_type = %code_type, code = %issued.code, "Issued code");
    }
    Ok(())
}
