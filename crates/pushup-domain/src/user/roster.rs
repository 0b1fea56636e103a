use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use super::aggregate::UserRecord;
use super::value_objects::ActivityStatus;
use crate::shared::UserId;

/// In-memory collection of user records, kept in insertion order.
///
/// Insertion order is the tie-breaker for every ranking.
#[derive(Debug, Clone, Default)]
pub struct UserRoster {
    users: IndexMap<UserId, UserRecord>,
}

impl UserRoster {
    pub fn new(users: IndexMap<UserId, UserRecord>) -> Self {
        Self { users }
    }

    pub fn get(&self, user_id: UserId) -> Option<&UserRecord> {
        self.users.get(&user_id)
    }

    pub fn get_mut(&mut self, user_id: UserId) -> Option<&mut UserRecord> {
        self.users.get_mut(&user_id)
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    /// Insert or replace; a replaced record keeps its original position
    pub fn upsert(&mut self, user_id: UserId, user: UserRecord) {
        self.users.insert(user_id, user);
    }

    pub fn remove(&mut self, user_id: UserId) -> Option<UserRecord> {
        self.users.shift_remove(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, &UserRecord)> {
        self.users.iter().map(|(id, user)| (*id, user))
    }

    pub fn records(&self) -> &IndexMap<UserId, UserRecord> {
        &self.users
    }

    /// Users whose last report falls on `today`
    pub fn active_today(&self, today: NaiveDate) -> Vec<(UserId, &UserRecord)> {
        self.iter()
            .filter(|(_, user)| user.has_reported_on(today))
            .collect()
    }

    /// Users idle for at least `days` whole days, or never seen at all
    pub fn inactive_for_days(&self, days: u32, now: NaiveDateTime) -> Vec<(UserId, &UserRecord)> {
        self.iter()
            .filter(|(_, user)| match user.last_activity() {
                Some(last) => now.signed_duration_since(last).num_days() >= i64::from(days),
                None => true,
            })
            .collect()
    }

    pub fn never_reported(&self) -> Vec<&UserRecord> {
        self.users
            .values()
            .filter(|user| user.last_report_date().is_none())
            .collect()
    }

    pub fn with_status(
        &self,
        status: ActivityStatus,
        now: NaiveDateTime,
        inactivity_days: u32,
        warning_days: u32,
    ) -> Vec<(UserId, &UserRecord)> {
        self.iter()
            .filter(|(_, user)| user.activity_status(now, inactivity_days, warning_days) == status)
            .collect()
    }

    pub fn total_today(&self, today: NaiveDate) -> u64 {
        self.active_today(today)
            .iter()
            .map(|(_, user)| u64::from(user.pushups_today()))
            .sum()
    }

    pub fn total_all_time(&self) -> u64 {
        self.users
            .values()
            .map(|user| u64::from(user.total_pushups()))
            .sum()
    }

    /// Today's reporters by today's count, highest first
    pub fn ranking_today(&self, today: NaiveDate) -> Vec<(UserId, &UserRecord)> {
        let mut ranking = self.active_today(today);
        // sort_by is stable, so equal counts keep insertion order
        ranking.sort_by(|a, b| b.1.pushups_today().cmp(&a.1.pushups_today()));
        ranking
    }

    /// Everyone by lifetime count, highest first
    pub fn ranking_all_time(&self) -> Vec<(UserId, &UserRecord)> {
        let mut ranking: Vec<_> = self.iter().collect();
        ranking.sort_by(|a, b| b.1.total_pushups().cmp(&a.1.total_pushups()));
        ranking
    }
}
