use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::dto::{Claims, JwtKeys};
use crate::{
    config::{JwtConfig, MAX_TOKEN_TTL_MINUTES},
    ledger::User,
    state::AppState,
};

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(0, MAX_TOKEN_TTL_MINUTES) as u64 * 60),
        }
    }

    /// Signed, time-limited token carrying the user's id, name and role.
    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        self.issue_at(user, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user: &User, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, role = %user.role, "jwt signed");
        Ok(token)
    }

    /// Decoded claims, or `None` for anything that is not a live token we signed.
    pub fn validate(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => {
                debug!(user_id = %data.claims.sub, "jwt verified");
                Some(data.claims)
            }
            Err(e) => {
                debug!(error = %e, "jwt rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Role;
    use uuid::Uuid;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "teacher".into(),
            password_hash: String::new(),
            role,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn issued_token_validates_immediately() {
        let keys = make_keys();
        let user = user(Role::Teacher);
        let token = keys.issue(&user).expect("sign");
        let claims = keys.validate(&token).expect("valid token");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "teacher");
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn default_lifetime_is_seven_days() {
        let keys = make_keys();
        let token = keys.issue(&user(Role::Admin)).unwrap();
        let claims = keys.validate(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn oversized_lifetime_is_capped() {
        let mut cfg = AppState::fake().config.jwt.clone();
        cfg.ttl_minutes = i64::MAX;
        let keys = JwtKeys::from_config(&cfg);
        let token = keys.issue(&user(Role::Teacher)).unwrap();
        let claims = keys.validate(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_TTL_MINUTES as usize * 60);
    }

    #[test]
    fn token_is_rejected_past_its_expiry() {
        let keys = make_keys();
        let ttl = TimeDuration::seconds(keys.ttl.as_secs() as i64);
        let user = user(Role::Teacher);

        let still_valid = keys
            .issue_at(&user, OffsetDateTime::now_utc() - ttl + TimeDuration::seconds(30))
            .unwrap();
        assert!(keys.validate(&still_valid).is_some());

        let expired = keys
            .issue_at(&user, OffsetDateTime::now_utc() - ttl - TimeDuration::seconds(30))
            .unwrap();
        assert!(keys.validate(&expired).is_none());
    }

    #[test]
    fn foreign_signature_and_garbage_are_invalid() {
        let keys = make_keys();
        let mut other_cfg = AppState::fake().config.jwt.clone();
        other_cfg.secret = "another-secret".into();
        let other = JwtKeys::from_config(&other_cfg);

        let token = other.issue(&user(Role::Admin)).unwrap();
        assert!(keys.validate(&token).is_none());
        assert!(keys.validate("").is_none());
        assert!(keys.validate("not.a.jwt").is_none());
    }

    #[test]
    fn wrong_audience_is_invalid() {
        let keys = make_keys();
        let mut cfg = AppState::fake().config.jwt.clone();
        cfg.audience = "someone-else".into();
        let token = JwtKeys::from_config(&cfg).issue(&user(Role::Teacher)).unwrap();
        assert!(keys.validate(&token).is_none());
    }
}
