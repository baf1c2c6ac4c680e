use super::{AccessToken, Clock, CredentialProvider};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Issues `token-1`, `token-2`, ... each valid for a fixed lifetime.
#[derive(Clone)]
pub struct MockCredentialProvider {
    clock: Arc<dyn Clock>,
    lifetime_secs: i64,
    fail: bool,
    call_count: Arc<Mutex<usize>>,
}

impl MockCredentialProvider {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            lifetime_secs: 3600,
            fail: false,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_lifetime(mut self, lifetime_secs: i64) -> Self {
        self.lifetime_secs = lifetime_secs;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl CredentialProvider for MockCredentialProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };

        if self.fail {
            return Err(Error::Configuration(
                "mock credential provider has no secret".to_string(),
            ));
        }

        Ok(AccessToken {
            token: format!("token-{}", count),
            expires_at: self.clock.now() + Duration::seconds(self.lifetime_secs),
        })
    }
}
