//! Mock authentication: a small user registry and HS256 bearer tokens.

use std::sync::Mutex;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use harvest_core::{AuthResponse, SignUpRequest, User, UserType};

use crate::error::ClientError;

/// Lifetime of a mock token.
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Claims carried by a mock bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: u64,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Issues and validates mock tokens.
pub struct TokenIssuer {
    secret: String,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        TokenIssuer {
            secret: secret.into(),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, ClientError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.user_id,
            email: user.email.clone(),
            user_type: user.user_type,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ClientError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Decodes a token; expired or foreign tokens are rejected with 401.
    pub fn validate(&self, token: &str) -> Result<Claims, ClientError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| ClientError::Application {
            status: 401,
            message: format!("Invalid token: {}", e),
        })
    }
}

struct Account {
    user: User,
    password: String,
}

/// In-memory user registry.
pub struct MockAuth {
    accounts: Mutex<Vec<Account>>,
    tokens: TokenIssuer,
}

impl MockAuth {
    /// Registry seeded with one customer and one farmer.
    pub fn seeded(token_secret: &str) -> Self {
        let seed = |user_id, email: &str, name: &str, user_type| Account {
            user: User {
                user_id,
                name: name.to_string(),
                email: email.to_string(),
                user_type,
            },
            password: "123456".to_string(),
        };

        MockAuth {
            accounts: Mutex::new(vec![
                seed(1, "customer@test.com", "Test Customer", UserType::Customer),
                seed(2, "farmer@test.com", "Test Farmer", UserType::Farmer),
            ]),
            tokens: TokenIssuer::new(token_secret),
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Exact `(email, password)` match. A miss is a `success: false` body,
    /// not an error.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let user = self
            .lock()
            .iter()
            .find(|account| account.user.email == email && account.password == password)
            .map(|account| account.user.clone());

        match user {
            Some(user) => {
                debug!(user_id = user.user_id, "Mock sign-in accepted");
                Ok(AuthResponse::granted(self.tokens.issue(&user)?, user))
            }
            None => Ok(AuthResponse::denied("Invalid email or password")),
        }
    }

    /// Registers a new account; a taken email leaves the registry untouched.
    pub fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ClientError> {
        let user = {
            let mut accounts = self.lock();
            if accounts.iter().any(|account| account.user.email == request.email) {
                return Ok(AuthResponse::denied("User with this email already exists"));
            }

            let user = User {
                user_id: accounts.len() as u64 + 1,
                name: request.name.clone(),
                email: request.email.clone(),
                user_type: request.user_type.unwrap_or_default(),
            };
            accounts.push(Account {
                user: user.clone(),
                password: request.password.clone(),
            });
            user
        };

        debug!(user_id = user.user_id, user_type = %user.user_type, "Mock account created");
        Ok(AuthResponse::granted(self.tokens.issue(&user)?, user))
    }

    pub fn user_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Account>> {
        self.accounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
