//! Per-user daily request ceiling.
//!
//! Usage is counted per UTC calendar day. A user's record resets the first
//! time it is touched on a new day; stale records from earlier days are
//! dropped by [`QuotaGate::purge_stale`].

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy)]
struct DailyUsage {
    day: NaiveDate,
    count: u32,
}

/// Snapshot of a user's quota for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub daily_limit: u32,
    pub used: u32,
    pub remaining: u32,
}

/// Thread-safe daily quota counter keyed by user id.
///
/// The check and the increment happen under one lock acquisition, so two
/// concurrent requests competing for the last slot can never both succeed.
#[derive(Debug)]
pub struct QuotaGate {
    daily_limit: u32,
    usage: Mutex<HashMap<String, DailyUsage>>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl QuotaGate {
    pub fn new(daily_limit: u32) -> Self {
        Self {
            daily_limit,
            usage: Mutex::new(HashMap::new()),
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Consume one request for `user_id` today. Returns the number of
    /// requests left after this one.
    pub fn check_and_increment(&self, user_id: &str) -> Result<u32, CoreError> {
        self.check_and_increment_at(user_id, today())
    }

    pub fn check_and_increment_at(&self, user_id: &str, day: NaiveDate) -> Result<u32, CoreError> {
        let mut usage = self.lock()?;
        let entry = usage
            .entry(user_id.to_string())
            .or_insert(DailyUsage { day, count: 0 });
        if entry.day != day {
            *entry = DailyUsage { day, count: 0 };
        }
        if entry.count >= self.daily_limit {
            return Err(CoreError::QuotaExceeded {
                limit: self.daily_limit,
            });
        }
        entry.count += 1;
        Ok(self.daily_limit - entry.count)
    }

    /// Requests left for `user_id` today, without consuming any.
    pub fn remaining(&self, user_id: &str) -> Result<u32, CoreError> {
        Ok(self.usage_at(user_id, today())?.remaining)
    }

    pub fn usage(&self, user_id: &str) -> Result<QuotaUsage, CoreError> {
        self.usage_at(user_id, today())
    }

    pub fn usage_at(&self, user_id: &str, day: NaiveDate) -> Result<QuotaUsage, CoreError> {
        let usage = self.lock()?;
        let used = usage
            .get(user_id)
            .filter(|u| u.day == day)
            .map_or(0, |u| u.count);
        Ok(QuotaUsage {
            daily_limit: self.daily_limit,
            used,
            remaining: self.daily_limit.saturating_sub(used),
        })
    }

    /// Drop records from days before `today`. Returns how many were removed.
    pub fn purge_stale(&self, today: NaiveDate) -> Result<usize, CoreError> {
        let mut usage = self.lock()?;
        let before = usage.len();
        usage.retain(|_, u| u.day >= today);
        Ok(before - usage.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, DailyUsage>>, CoreError> {
        self.usage
            .lock()
            .map_err(|_| CoreError::Internal("quota lock poisoned".into()))
    }
}
