//! Condition tags
//!
//! Tags are opaque markers held by an effect owner. They drive every gate in
//! the effect lifecycle:
//! - activation/application gates query them (`contains_all` / `contains_any`)
//! - active effects grant and revoke them
//! - effects with a condition-dependent application gate subscribe to changes
//!
//! Add and remove are idempotent: adding a held tag or removing an absent one
//! is a no-op and fires no notification. Notifications are delivered once per
//! individual tag change, never batched.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// An opaque condition marker, e.g. `"status.stunned"` or `"effect.poison"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inline-allocated tag list; effect definitions rarely list more than a few.
pub type TagList = SmallVec<[Tag; 4]>;

/// An owned change-notification handle.
///
/// Created by [`TagSet::subscribe`] and consumed exactly once by
/// [`TagSet::unsubscribe`]. Deliberately neither `Clone` nor `Copy`: there is
/// exactly one handle per listener, so tearing it down on every exit path is
/// enough to guarantee no dangling subscriptions.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
}

/// The mutable condition set shared by every effect on one owner.
///
/// Change notifications use per-subscriber mailboxes rather than callbacks:
/// each membership change appends the tag to every mailbox, and the owner
/// drains mailboxes after any mutation. This keeps re-entrant changes (an
/// effect granting a tag that gates another effect) safe to process without
/// aliasing the set itself.
#[derive(Debug, Default)]
pub struct TagSet {
    owned: HashSet<Tag>,
    mailboxes: HashMap<u64, Vec<Tag>>,
    next_subscription: u64,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns true if membership changed.
    pub fn add(&mut self, tag: Tag) -> bool {
        if self.owned.contains(&tag) {
            return false;
        }
        self.notify(&tag);
        self.owned.insert(tag);
        true
    }

    /// Remove a tag. Returns true if membership changed.
    pub fn remove(&mut self, tag: &Tag) -> bool {
        if !self.owned.remove(tag) {
            return false;
        }
        self.notify(tag);
        true
    }

    pub fn add_all(&mut self, tags: &[Tag]) {
        for tag in tags {
            self.add(tag.clone());
        }
    }

    pub fn remove_all(&mut self, tags: &[Tag]) {
        for tag in tags {
            self.remove(tag);
        }
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.owned.contains(tag)
    }

    /// True when every listed tag is held. An empty list always passes.
    pub fn contains_all(&self, tags: &[Tag]) -> bool {
        tags.iter().all(|tag| self.owned.contains(tag))
    }

    /// True when at least one listed tag is held. An empty list never passes.
    pub fn contains_any(&self, tags: &[Tag]) -> bool {
        tags.iter().any(|tag| self.owned.contains(tag))
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.owned.iter()
    }

    /// Register a change listener and return its owned handle.
    pub fn subscribe(&mut self) -> Subscription {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.mailboxes.insert(id, Vec::new());
        Subscription { id }
    }

    /// Tear down a listener, consuming its handle. Pending changes for that
    /// listener are discarded.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.mailboxes.remove(&subscription.id);
    }

    /// Drain the changed tags queued for one listener since the last drain.
    pub fn take_changes(&mut self, subscription: &Subscription) -> Vec<Tag> {
        self.mailboxes
            .get_mut(&subscription.id)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// True while any listener still has undelivered changes.
    pub fn has_pending_changes(&self) -> bool {
        self.mailboxes.values().any(|mailbox| !mailbox.is_empty())
    }

    /// Discard all undelivered changes. Used as a last resort when a grant
    /// cycle fails to settle.
    pub fn clear_pending(&mut self) {
        for mailbox in self.mailboxes.values_mut() {
            mailbox.clear();
        }
    }

    fn notify(&mut self, tag: &Tag) {
        for mailbox in self.mailboxes.values_mut() {
            mailbox.push(tag.clone());
        }
    }
}
