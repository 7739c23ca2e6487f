//! Membership mutation and expiry semantics.
//!
//! The algorithms here are written against [`MembershipTransaction`] and
//! never open or commit transactions themselves. Adapters run them inside a
//! store transaction and roll back whenever they return `Err`, which is what
//! makes a mutation or a sweep all-or-nothing.
//!
//! [`MembershipTransaction`]: crate::domain::ports::MembershipTransaction

mod expiry;
mod mutation;

pub use expiry::{ExpirySweepReport, sweep_expired};
pub use mutation::{MembershipMutationError, MutationOutcome, apply_mutation};

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, Utc};

use super::{SegmentSlug, UserId};

/// Lifetime granted to memberships created by one request.
///
/// Zero days yields memberships that expire today and are removed by the
/// next sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipTtl(u32);

impl MembershipTtl {
    /// TTL of `days` whole days.
    #[must_use]
    pub fn days(days: u32) -> Self {
        Self(days)
    }

    /// Expiry date for memberships created on `today`, or `None` if it
    /// falls outside the calendar range.
    #[must_use]
    pub fn expiry_date(self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_add_days(Days::new(u64::from(self.0)))
    }
}

/// Reasons a membership request is rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipRequestError {
    /// The same slug was asked to be both added and removed.
    #[error("segments cannot be added and removed at once: {}", .slugs.join(", "))]
    Overlap { slugs: Vec<String> },
    /// The TTL pushes the expiry date past the supported calendar.
    #[error("membership ttl of {days} days is out of range")]
    TtlOutOfRange { days: u32 },
}

/// Validated request to change one user's memberships.
///
/// Slug lists are deduplicated, keeping first occurrences in order.
///
/// # Examples
/// ```
/// use segments::domain::{MembershipRequest, SegmentSlug, UserId};
///
/// let slug = |s: &str| SegmentSlug::new(s).expect("non-empty");
/// let user = UserId::new(1).expect("positive");
/// let request = MembershipRequest::new(user, vec![slug("A"), slug("A")], vec![slug("B")], None)
///     .expect("disjoint");
/// assert_eq!(request.add().len(), 1);
///
/// let overlap = MembershipRequest::new(user, vec![slug("A")], vec![slug("A")], None);
/// assert!(overlap.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipRequest {
    user_id: UserId,
    add: Vec<SegmentSlug>,
    remove: Vec<SegmentSlug>,
    ttl: Option<MembershipTtl>,
}

fn dedup(slugs: Vec<SegmentSlug>) -> Vec<SegmentSlug> {
    let mut seen = BTreeSet::new();
    slugs
        .into_iter()
        .filter(|slug| seen.insert(slug.clone()))
        .collect()
}

impl MembershipRequest {
    /// Validate that `add` and `remove` are disjoint.
    pub fn new(
        user_id: UserId,
        add: Vec<SegmentSlug>,
        remove: Vec<SegmentSlug>,
        ttl: Option<MembershipTtl>,
    ) -> Result<Self, MembershipRequestError> {
        let add = dedup(add);
        let remove = dedup(remove);
        let overlap: Vec<String> = add
            .iter()
            .filter(|slug| remove.contains(slug))
            .map(ToString::to_string)
            .collect();
        if !overlap.is_empty() {
            return Err(MembershipRequestError::Overlap { slugs: overlap });
        }
        Ok(Self {
            user_id,
            add,
            remove,
            ttl,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn add(&self) -> &[SegmentSlug] {
        &self.add
    }

    pub fn remove(&self) -> &[SegmentSlug] {
        &self.remove
    }

    pub fn ttl(&self) -> Option<MembershipTtl> {
        self.ttl
    }

    /// Fix the request in time: compute the shared expiry date from `now`
    /// and stamp the audit timestamp.
    pub fn into_mutation(
        self,
        now: DateTime<Utc>,
    ) -> Result<MembershipMutation, MembershipRequestError> {
        let alive_until = match self.ttl {
            Some(ttl) => Some(
                ttl.expiry_date(now.date_naive())
                    .ok_or(MembershipRequestError::TtlOutOfRange { days: ttl.0 })?,
            ),
            None => None,
        };
        Ok(MembershipMutation {
            user_id: self.user_id,
            add: self.add,
            remove: self.remove,
            alive_until,
            recorded_at: now,
        })
    }
}

/// A membership change ready to run inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipMutation {
    pub user_id: UserId,
    pub add: Vec<SegmentSlug>,
    pub remove: Vec<SegmentSlug>,
    /// Expiry shared by every membership added; `None` means permanent.
    pub alive_until: Option<NaiveDate>,
    /// Timestamp written to every audit record of this mutation.
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod test_support;
