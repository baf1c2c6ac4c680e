//! Credentials for the Vertex AI endpoints
//!
//! A [`CredentialProvider`] mints access tokens; a [`TokenCache`] owns one and
//! hands out the cached token until it is close to expiry.

pub mod mock;
pub mod service_account;
pub mod token_cache;

pub use mock::{ManualClock, MockCredentialProvider};
pub use service_account::{ServiceAccountCredentials, ServiceAccountTokenProvider};
pub use token_cache::TokenCache;

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken>;
}

/// Time source, injectable so token expiry can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
