// security/src/auth.rs
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{HospitalId, Login, NewUser, Role, User, UserProfile};
use neocare_lib::config::AuthConfig;
use neocare_lib::storage_engine::UserStorageEngine;

use crate::context::RequestContext;
use crate::errors::{AuthError, AuthResult};

/// Hashes a password using Argon2.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHashError(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against an Argon2 hash.
pub fn verify_password(password: &str, hashed_password: &str) -> AuthResult<bool> {
    let password_hash = PasswordHash::new(hashed_password)
        .map_err(|e| AuthError::PasswordHashError(format!("Failed to parse password hash: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &password_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHashError(format!("Failed to verify password: {}", e))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Staff,
    Portal,
}

/// Claims for JWT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id for staff tokens, child id for portal tokens.
    pub sub: String,
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<HospitalId>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }

    pub fn into_context(self) -> AuthResult<RequestContext> {
        let subject = Uuid::parse_str(&self.sub)
            .map_err(|e| AuthError::InvalidToken(format!("bad subject: {}", e)))?;
        match self.kind {
            TokenKind::Staff => {
                let role = self.role.ok_or_else(|| AuthError::InvalidToken("staff token without role".to_string()))?;
                Ok(RequestContext::staff(subject, self.username.unwrap_or_default(), role, self.hospital_id))
            }
            TokenKind::Portal => Ok(RequestContext::parent(subject)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 signing keys and token lifetimes.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    staff_ttl: Duration,
    portal_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], staff_ttl: Duration, portal_ttl: Duration) -> Self {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            staff_ttl,
            portal_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::hours(config.token_ttl_hours as i64),
            Duration::minutes(config.portal_token_ttl_minutes as i64),
        )
    }

    pub fn issue_staff_token(&self, user: &User, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let claims = Claims {
            sub: user.id.to_string(),
            kind: TokenKind::Staff,
            username: Some(user.username.clone()),
            role: Some(user.role),
            hospital_id: user.hospital_id,
            iat: now.timestamp(),
            exp: (now + self.staff_ttl).timestamp(),
        };
        self.sign(claims)
    }

    pub fn issue_portal_token(&self, child_id: Uuid, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let claims = Claims {
            sub: child_id.to_string(),
            kind: TokenKind::Portal,
            username: None,
            role: None,
            hospital_id: None,
            iat: now.timestamp(),
            exp: (now + self.portal_ttl).timestamp(),
        };
        self.sign(claims)
    }

    fn sign(&self, claims: Claims) -> AuthResult<IssuedToken> {
        let expires_at = claims.expires_at();
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(format!("Failed to encode JWT: {}", e)))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Decodes and validates a JWT token, including its expiry.
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    pub fn context_from_token(&self, token: &str) -> AuthResult<RequestContext> {
        self.decode(token)?.into_context()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// Logs in a staff member. Unknown usernames and wrong passwords fail alike.
pub async fn login<S>(storage: &S, keys: &JwtKeys, login: &Login, now: DateTime<Utc>) -> AuthResult<LoginResponse>
where
    S: UserStorageEngine + ?Sized,
{
    let Some(mut user) = storage.get_user_by_username(&login.username).await? else {
        debug!("Login attempt for unknown user '{}'", login.username);
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(&login.password, &user.password_hash)? {
        warn!("Failed login for user '{}'", user.username);
        return Err(AuthError::InvalidCredentials);
    }

    user.last_login = Some(now);
    user.updated_at = now;
    storage.update_user(&user).await?;

    let issued = keys.issue_staff_token(&user, now)?;
    info!("User '{}' logged in as {}", user.username, user.role);
    Ok(LoginResponse { token: issued.token, expires_at: issued.expires_at, user: user.profile() })
}

/// Validates, hashes and stores a new staff account.
pub async fn create_user<S>(storage: &S, new_user: &NewUser, now: DateTime<Utc>) -> AuthResult<User>
where
    S: UserStorageEngine + ?Sized,
{
    let valid = new_user.validated()?;
    let password_hash = hash_password(&valid.password)?;
    let user = User::from_new_user(valid, password_hash, now);
    storage.add_user(&user).await?;
    info!("Created {} account '{}'", user.role, user.username);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::NewHospital;
    use neocare_lib::storage_engine::{HospitalStorage, SledStorage};

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn keys() -> JwtKeys {
        JwtKeys::new(SECRET, Duration::hours(12), Duration::minutes(30))
    }

    fn nurse(hospital_id: HospitalId) -> NewUser {
        NewUser {
            first: "Wanjiru".into(),
            last: "Kamau".into(),
            username: "wkamau".into(),
            email: "wkamau@example.org".into(),
            password: "correct horse".into(),
            phone: None,
            role: Role::Nurse,
            hospital_id: Some(hospital_id),
        }
    }

    async fn storage_with_hospital() -> (SledStorage, HospitalId) {
        let storage = SledStorage::temporary().unwrap();
        let hospital = NewHospital { name: "Kisumu County".into(), address: None, phone: None, email: None };
        let id = storage.create_hospital(hospital, Utc::now()).await.unwrap().id;
        (storage, id)
    }

    #[test]
    fn should_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn should_round_trip_staff_claims_into_context() {
        let user = User::from_new_user(nurse(4), "hash".into(), Utc::now());
        let issued = keys().issue_staff_token(&user, Utc::now()).unwrap();
        let ctx = keys().context_from_token(&issued.token).unwrap();
        assert_eq!(ctx, RequestContext::staff(user.id, "wkamau", Role::Nurse, Some(4)));
    }

    #[test]
    fn should_issue_child_scoped_portal_token() {
        let child_id = Uuid::new_v4();
        let now = Utc::now();
        let issued = keys().issue_portal_token(child_id, now).unwrap();
        assert_eq!(issued.expires_at.timestamp(), (now + Duration::minutes(30)).timestamp());
        assert_eq!(keys().context_from_token(&issued.token).unwrap(), RequestContext::parent(child_id));
    }

    #[test]
    fn should_reject_expired_and_foreign_tokens() {
        let user = User::from_new_user(nurse(1), "hash".into(), Utc::now());
        let stale = keys().issue_staff_token(&user, Utc::now() - Duration::days(2)).unwrap();
        assert!(matches!(keys().decode(&stale.token), Err(AuthError::InvalidToken(_))));

        let other = JwtKeys::new(b"another-secret-another-secret-32", Duration::hours(1), Duration::minutes(1));
        let forged = other.issue_staff_token(&user, Utc::now()).unwrap();
        assert!(matches!(keys().decode(&forged.token), Err(AuthError::InvalidToken(_))));
        assert!(keys().decode("not-a-token").is_err());
    }

    #[tokio::test]
    async fn should_login_and_stamp_last_login() {
        let (storage, hospital) = storage_with_hospital().await;
        create_user(&storage, &nurse(hospital), Utc::now()).await.unwrap();

        let now = Utc::now();
        let credentials = Login { username: "WKamau".into(), password: "correct horse".into() };
        let response = login(&storage, &keys(), &credentials, now).await.unwrap();
        assert_eq!(response.user.username, "wkamau");
        assert_eq!(response.user.last_login, Some(now));

        let stored = storage.get_user_by_username("wkamau").await.unwrap().unwrap();
        assert_eq!(stored.last_login, Some(now));
        let ctx = keys().context_from_token(&response.token).unwrap();
        assert_eq!(ctx.require_staff().unwrap(), (stored.id, Role::Nurse));
    }

    #[tokio::test]
    async fn should_fail_login_uniformly() {
        let (storage, hospital) = storage_with_hospital().await;
        create_user(&storage, &nurse(hospital), Utc::now()).await.unwrap();

        let wrong_password = Login { username: "wkamau".into(), password: "nope nope".into() };
        let unknown_user = Login { username: "ghost".into(), password: "correct horse".into() };
        assert!(matches!(login(&storage, &keys(), &wrong_password, Utc::now()).await, Err(AuthError::InvalidCredentials)));
        assert!(matches!(login(&storage, &keys(), &unknown_user, Utc::now()).await, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn should_reject_duplicate_username() {
        let (storage, hospital) = storage_with_hospital().await;
        create_user(&storage, &nurse(hospital), Utc::now()).await.unwrap();
        let mut again = nurse(hospital);
        again.username = "WKAMAU".into();
        assert!(matches!(create_user(&storage, &again, Utc::now()).await, Err(AuthError::UserExists)));
    }

    #[tokio::test]
    async fn should_never_store_plaintext_password() {
        let (storage, hospital) = storage_with_hospital().await;
        let user = create_user(&storage, &nurse(hospital), Utc::now()).await.unwrap();
        assert!(user.password_hash.starts_with("$argon2"));
        assert!(!user.password_hash.contains("correct horse"));
    }
}
