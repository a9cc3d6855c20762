//! Admin authentication by password and cookie

use argon2::Argon2;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::convert::Infallible;

use super::{AppState, Error};
use crate::config::BlogConfig;

pub const KEY_LENGTH: usize = 32;

/// Hashes a secret with Argon2, salted with the admin cookie key.
fn hash_secret(
    hasher: &Argon2,
    secret: &str,
    salt: &[u8],
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
    let mut hash = [0; KEY_LENGTH];

    hasher.hash_password_into(secret.as_bytes(), salt, &mut hash)?;
    Ok(hash)
}

/// Hashed admin credentials, computed once at startup
pub struct AdminAuth {
    hasher: Argon2<'static>,
    salt: Vec<u8>,
    password: [u8; KEY_LENGTH],
    cookie_key: String,
    cookie_token: String,
}

impl AdminAuth {
    pub fn new(config: &BlogConfig) -> Result<Self, argon2::Error> {
        let hasher = Argon2::default();
        // Argon2 wants at least 8 bytes of salt
        let salt = format!("quill-admin:{}", config.admin_cookie_key).into_bytes();
        let password = hash_secret(&hasher, &config.admin_password, &salt)?;
        let cookie_value = hash_secret(&hasher, &config.admin_cookie_value, &salt)?;

        Ok(Self {
            hasher,
            salt,
            password,
            cookie_key: config.admin_cookie_key.clone(),
            cookie_token: URL_SAFE_NO_PAD.encode(cookie_value),
        })
    }

    pub fn verify_password(&self, password: &str) -> bool {
        match hash_secret(&self.hasher, password, &self.salt) {
            Ok(hashed) => hashed == self.password,
            Err(e) => {
                tracing::warn!("Failed to hash submitted password: {}", e);
                false
            }
        }
    }

    /// Cookie granting admin access
    pub fn login_cookie(&self) -> cookie::Cookie<'static> {
        cookie::Cookie::build((self.cookie_key.clone(), self.cookie_token.clone()))
            .http_only(true)
            .path("/")
            .build()
    }

    /// Empty cookie used to invalidate a previous one
    pub fn logout_cookie(&self) -> cookie::Cookie<'static> {
        cookie::Cookie::build(self.cookie_key.clone())
            .http_only(true)
            .path("/")
            .max_age(cookie::time::Duration::ZERO)
            .build()
    }

    pub fn is_admin(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(header::COOKIE)
            .into_iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(cookie::Cookie::split_parse)
            .filter_map(Result::ok)
            .any(|cookie| cookie.name() == self.cookie_key && cookie.value() == self.cookie_token)
    }
}

/// Whether the request carries the admin cookie
///
/// ```ignore
/// async fn route(IsAdmin(admin): IsAdmin) { /* show hidden posts when admin */ }
/// ```
pub struct IsAdmin(pub bool);

#[async_trait]
impl FromRequestParts<AppState> for IsAdmin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(IsAdmin(state.auth.is_admin(&parts.headers)))
    }
}

/// Guard for admin-only routes; rejects with 401 otherwise
pub struct Admin;

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.auth.is_admin(&parts.headers) {
            Ok(Admin)
        } else {
            Err(Error::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth() -> AdminAuth {
        let config = BlogConfig {
            admin_password: "hunter2".to_string(),
            admin_cookie_key: "blog_admin".to_string(),
            admin_cookie_value: "letmein".to_string(),
            ..Default::default()
        };
        AdminAuth::new(&config).unwrap()
    }

    #[test]
    fn test_verify_password() {
        let auth = auth();
        assert!(auth.verify_password("hunter2"));
        assert!(!auth.verify_password("hunter3"));
    }

    #[test]
    fn test_login_cookie_grants_admin() {
        let auth = auth();
        let cookie = auth.login_cookie();
        assert_eq!(cookie.name(), "blog_admin");
        assert_ne!(cookie.value(), "letmein");

        let mut headers = HeaderMap::new();
        let value = format!("other=1; {}={}", cookie.name(), cookie.value());
        headers.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());
        assert!(auth.is_admin(&headers));

        let mut forged = HeaderMap::new();
        forged.insert(header::COOKIE, HeaderValue::from_static("blog_admin=letmein"));
        assert!(!auth.is_admin(&forged));
        assert!(!auth.is_admin(&HeaderMap::new()));
    }

    #[test]
    fn test_logout_cookie_expires() {
        let cookie = auth().logout_cookie();
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
        assert_eq!(cookie.value(), "");
    }
}
