//! Authorization code repository: issuance, validation and consumption.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use tracing::debug;

use meridian_core::authorization::{AuthorizationType, CodeRecord, CodeValidation};
use meridian_shared::types::{AuthorizationCodeId, UserId};

use crate::entities::{authorization_codes, sea_orm_active_enums::CodeType};

/// Length of generated codes.
pub const CODE_LENGTH: usize = 10;

/// Authorization code repository.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeRepository {
    db: DatabaseConnection,
}

impl AuthorizationCodeRepository {
    /// Creates a new authorization code repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Generates a random upper-case alphanumeric code.
    #[must_use]
    pub fn generate_code() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(CODE_LENGTH)
            .map(char::from)
            .collect::<String>()
            .to_uppercase()
    }

    /// Issues a new code, optionally scoped to one user and expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn issue(
        &self,
        code_type: AuthorizationType,
        user_id: Option<UserId>,
        ttl: Option<Duration>,
    ) -> Result<authorization_codes::Model, DbErr> {
        self.insert(Self::generate_code(), code_type, user_id, ttl)
            .await
    }

    /// Stores a code with a caller-chosen value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert(
        &self,
        code: String,
        code_type: AuthorizationType,
        user_id: Option<UserId>,
        ttl: Option<Duration>,
    ) -> Result<authorization_codes::Model, DbErr> {
        let now = Utc::now();
        let model = authorization_codes::ActiveModel {
            id: Set(AuthorizationCodeId::new().into_inner()),
            code: Set(code),
            code_type: Set(code_type.into()),
            user_id: Set(user_id.map(UserId::into_inner)),
            is_used: Set(false),
            used_at: Set(None),
            created_at: Set(now.into()),
            expires_at: Set(ttl.map(|ttl| (now + ttl).into())),
        };
        let model = model.insert(&self.db).await?;
        debug!(code_id = %model.id, code_type = %code_type, "Authorization code issued");
        Ok(model)
    }

    /// Finds a code by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: AuthorizationCodeId,
    ) -> Result<Option<authorization_codes::Model>, DbErr> {
        authorization_codes::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Checks whether `code` may be consumed by `user_id` for `code_type`.
    ///
    /// Does not consume the code; validation may run any number of times.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn validate(
        &self,
        code: &str,
        code_type: AuthorizationType,
        user_id: Option<UserId>,
    ) -> Result<CodeValidation, DbErr> {
        validate_code(&self.db, code, code_type, user_id, Utc::now()).await
    }

    /// Marks a code as used. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_used(&self, id: AuthorizationCodeId) -> Result<(), DbErr> {
        let consumed = consume_code(&self.db, id, Utc::now()).await?;
        if !consumed {
            debug!(code_id = %id, "Authorization code already used or missing");
        }
        Ok(())
    }
}

/// Looks up unused records matching value and type and applies the usage rule.
pub(crate) async fn validate_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    code_type: AuthorizationType,
    user_id: Option<UserId>,
    now: DateTime<Utc>,
) -> Result<CodeValidation, DbErr> {
    let code = code.trim();
    if code.is_empty() {
        return Ok(CodeValidation::rejected(code_type));
    }

    let candidates = authorization_codes::Entity::find()
        .filter(authorization_codes::Column::Code.eq(code))
        .filter(authorization_codes::Column::CodeType.eq(CodeType::from(code_type)))
        .filter(authorization_codes::Column::IsUsed.eq(false))
        .all(conn)
        .await?;

    let usable = candidates
        .iter()
        .map(CodeRecord::from)
        .find(|record| record.is_usable_by(user_id, now));

    Ok(usable.map_or_else(
        || CodeValidation::rejected(code_type),
        |record| CodeValidation::accepted(record.id),
    ))
}

/// Flips `is_used` only if it is still false. Returns true if this call
/// consumed the code.
pub(crate) async fn consume_code<C: ConnectionTrait>(
    conn: &C,
    id: AuthorizationCodeId,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let result = authorization_codes::Entity::update_many()
        .col_expr(authorization_codes::Column::IsUsed, Expr::value(true))
        .col_expr(
            authorization_codes::Column::UsedAt,
            Expr::value(Some(now.fixed_offset())),
        )
        .filter(authorization_codes::Column::Id.eq(id.into_inner()))
        .filter(authorization_codes::Column::IsUsed.eq(false))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}
