//! Authorization gate: token → live account → role / ownership checks.

use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::accounts::model::{Account, Role};
use crate::error::ApiError;
use crate::store::AccountRepo;

/// A verified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl From<&Account> for Identity {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            role: account.role,
        }
    }
}

/// Resolves a bearer token to a live account. Every failure, whatever its
/// cause, is reported as the same `Unauthenticated` error.
pub async fn authenticate(
    keys: &JwtKeys,
    accounts: &dyn AccountRepo,
    token: &str,
) -> Result<Account, ApiError> {
    let account_id = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        ApiError::Unauthenticated
    })?;

    match accounts.find_by_id(account_id).await? {
        Some(account) if account.is_active => Ok(account),
        Some(_) => {
            warn!(%account_id, "token for deactivated account");
            Err(ApiError::Unauthenticated)
        }
        None => {
            warn!(%account_id, "token for unknown account");
            Err(ApiError::Unauthenticated)
        }
    }
}

pub fn authorize(identity: &Identity, required: &[Role]) -> Result<(), ApiError> {
    if required.contains(&identity.role) {
        return Ok(());
    }
    warn!(account_id = %identity.id, role = ?identity.role, ?required, "role check failed");
    Err(ApiError::forbidden(
        "your role is not permitted to perform this action",
    ))
}

pub fn ensure_owner_or_admin(identity: &Identity, owner_id: Uuid) -> Result<(), ApiError> {
    if identity.id == owner_id || identity.role == Role::Admin {
        return Ok(());
    }
    warn!(account_id = %identity.id, %owner_id, "ownership check failed");
    Err(ApiError::forbidden("you do not own this resource"))
}
