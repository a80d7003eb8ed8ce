//! Login/session management via signed remember cookies.

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::warn;

use super::{Extensions, signing};
use crate::config::SecretKey;
use crate::storage::{Database, StorageError, User};

/// Default name of the remember cookie.
pub const REMEMBER_COOKIE_NAME: &str = "remember_token";

const PURPOSE: &str = "login";

/// Looks users up by id for the login manager.
#[async_trait]
pub trait UserLoader: Send + Sync {
    async fn load_user(&self, id: i64) -> Result<Option<User>, StorageError>;
}

#[async_trait]
impl UserLoader for Database {
    async fn load_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        self.find_user(id).await
    }
}

/// Issues and verifies `"<user id>|<signature>"` cookies.
#[derive(Clone)]
pub struct LoginManager {
    key: Arc<[u8]>,
    cookie_name: String,
}

impl LoginManager {
    pub fn new(secret: &SecretKey) -> Self {
        Self {
            key: Arc::from(secret.as_bytes()),
            cookie_name: REMEMBER_COOKIE_NAME.to_string(),
        }
    }

    /// Cookie value remembering `user_id`.
    pub fn remember_cookie(&self, user_id: i64) -> String {
        let id = user_id.to_string();
        let signature = signing::sign(&self.key, PURPOSE, &id);
        format!("{}|{}", id, signature)
    }

    /// User id carried by a cookie value, if its signature holds.
    pub fn user_id(&self, cookie: &str) -> Option<i64> {
        let (id, signature) = cookie.split_once('|')?;
        if !signing::verify(&self.key, PURPOSE, id, signature) {
            return None;
        }
        id.parse().ok()
    }

    /// User id from the request's `Cookie` header.
    pub fn user_id_from_headers(&self, headers: &HeaderMap) -> Option<i64> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .and_then(|(_, value)| self.user_id(value))
    }

    /// Resolves the user behind a cookie. Tampered cookies yield `None`.
    pub async fn load_user(
        &self,
        loader: &dyn UserLoader,
        cookie: &str,
    ) -> Result<Option<User>, StorageError> {
        match self.user_id(cookie) {
            Some(id) => loader.load_user(id).await,
            None => Ok(None),
        }
    }
}

/// The user remembered by the request's cookie, if any.
///
/// Inserted into request extensions by [`remember_user`].
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

/// Middleware resolving the remember cookie into a [`CurrentUser`].
///
/// Storage failures degrade to an anonymous request.
pub async fn remember_user(
    State(extensions): State<Arc<Extensions>>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = match extensions.login_manager.user_id_from_headers(req.headers()) {
        Some(id) => extensions.db.load_user(id).await.unwrap_or_else(|e| {
            warn!(user_id = id, error = %e, "Failed to load remembered user");
            None
        }),
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}
