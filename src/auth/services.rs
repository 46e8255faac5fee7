use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use crate::{
    error::{ApiError, StoreError},
    ledger::{LedgerStore, Role, User},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub const MAX_USERNAME_CHARS: usize = 64;

/// Any script is allowed; whitespace and control characters are not.
pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[^\s\p{Cc}]{1,64}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Hashes the password and stores a new credential record.
pub async fn create_user(
    store: &dyn LedgerStore,
    username: &str,
    password: &str,
    role: Role,
) -> Result<User, ApiError> {
    let password_hash = hash_password(password).map_err(ApiError::internal)?;
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash,
        role,
        created_at: OffsetDateTime::now_utc(),
    };
    store.insert_user(&user).await.map_err(|e| match e {
        StoreError::DuplicateKey { .. } => ApiError::Conflict("username already exists".into()),
        other => other.into(),
    })?;
    info!(user_id = %user.id, username = %user.username, role = %user.role, "user created");
    Ok(user)
}

/// The matching user, or `Unauthorized` without revealing which half was wrong.
pub async fn authenticate(
    store: &dyn LedgerStore,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    let invalid = || ApiError::Unauthorized("invalid credentials".into());

    let Some(user) = store.find_user_by_username(username).await? else {
        warn!(%username, "login unknown username");
        return Err(invalid());
    };

    if !verify_password(password, &user.password_hash).map_err(ApiError::internal)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(invalid());
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    #[test]
    fn username_rules() {
        assert!(is_valid_username("teacher"));
        assert!(is_valid_username("j.doe-2"));
        assert!(is_valid_username("ab"));
        assert!(is_valid_username("élève"));
        assert!(is_valid_username(&"é".repeat(MAX_USERNAME_CHARS)));
        assert!(!is_valid_username(&"é".repeat(MAX_USERNAME_CHARS + 1)));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("tab\there"));
        assert!(!is_valid_username(""));
    }

    #[tokio::test]
    async fn created_user_can_authenticate() {
        let store = MemoryLedger::new();
        create_user(&store, "teacher", "teacher123", Role::Teacher)
            .await
            .unwrap();

        let user = authenticate(&store, "teacher", "teacher123").await.unwrap();
        assert_eq!(user.role, Role::Teacher);

        let err = authenticate(&store, "teacher", "wrong-pass").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        let err = authenticate(&store, "nobody", "teacher123").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = MemoryLedger::new();
        create_user(&store, "admin", "admin123", Role::Admin).await.unwrap();
        let err = create_user(&store, "admin", "other-pass", Role::Teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }
}
