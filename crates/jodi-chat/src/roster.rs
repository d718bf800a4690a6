//! Conversation list reconciler.
//!
//! The [`Roster`] merges paginated fetches with live push updates while
//! keeping one invariant at all times: at most one entry per counterparty
//! `user_id`. Page 0 replaces the list, later pages append only unseen
//! entries, and pushes reorder most-recent-first.

use std::collections::HashSet;

use crate::{
    event::{PageRequest, RosterFilter},
    model::{ChatMessage, Conversation, ConversationPage, CounterpartyProfile, UserId},
};

/// Paginated, searchable conversation list.
#[derive(Debug, Clone)]
pub struct Roster {
    conversations: Vec<Conversation>,
    filter: RosterFilter,
    search: String,
    page_size: u32,
    page: u32,
    has_more: bool,
    loading: bool,
    /// Bumped whenever filter or search resets pagination. Responses carrying
    /// an older generation are discarded instead of merged.
    generation: u64,
}

impl Roster {
    /// Create an empty roster with the given page size.
    pub fn new(page_size: u32) -> Self {
        Self {
            conversations: Vec::new(),
            filter: RosterFilter::All,
            search: String::new(),
            page_size,
            page: 0,
            has_more: true,
            loading: false,
            generation: 0,
        }
    }

    /// Current conversations, most recent first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Active roster filter.
    pub fn filter(&self) -> RosterFilter {
        self.filter
    }

    /// Whether a page fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the server reported more pages.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Look up a conversation by counterparty.
    pub fn get(&self, user_id: UserId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.user_id == user_id)
    }

    /// Build the request for a fresh page 0, discarding accumulated pages.
    pub fn first_page_request(&mut self) -> PageRequest {
        self.page = 0;
        self.has_more = true;
        self.generation += 1;
        self.loading = true;
        self.request_for(0)
    }

    /// Build the request for the next page, if more results exist and no
    /// fetch is already in flight.
    pub fn next_page_request(&mut self) -> Option<PageRequest> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some(self.request_for(self.page + 1))
    }

    /// Switch the filter tab and reset pagination.
    pub fn set_filter(&mut self, filter: RosterFilter) -> PageRequest {
        self.filter = filter;
        self.first_page_request()
    }

    /// Change the search term and reset pagination.
    pub fn set_search(&mut self, search: String) -> PageRequest {
        self.search = search;
        self.first_page_request()
    }

    /// Merge a fetched page into the roster.
    ///
    /// Page 0 replaces the list; later pages append only entries whose
    /// `user_id` is not already present (first-seen order wins). When merging
    /// page 0 on the unfiltered view, a missing `active` conversation is
    /// re-spliced at the front so a draft the server has not persisted yet
    /// survives the refresh. On the unread filter it is allowed to disappear.
    ///
    /// Returns `false` if the response is stale and was discarded.
    pub fn apply_page(
        &mut self,
        request: &PageRequest,
        page: ConversationPage,
        active: Option<&Conversation>,
    ) -> bool {
        if request.generation != self.generation {
            tracing::debug!(
                stale = request.generation,
                current = self.generation,
                "discarding stale conversation page"
            );
            return false;
        }

        self.loading = false;
        self.has_more = !page.last;
        self.page = request.page;

        if request.page == 0 {
            let mut merged = page.content;
            if self.filter == RosterFilter::All
                && let Some(active) = active
                && !merged.iter().any(|c| c.user_id == active.user_id)
            {
                merged.insert(0, active.clone());
            }
            self.conversations = dedup_by_user(merged);
        } else {
            let existing: HashSet<UserId> =
                self.conversations.iter().map(|c| c.user_id).collect();
            self.conversations
                .extend(page.content.into_iter().filter(|c| !existing.contains(&c.user_id)));
        }

        true
    }

    /// Clear the loading flag after a failed page fetch.
    pub fn fetch_failed(&mut self, request: &PageRequest) {
        if request.generation == self.generation {
            self.loading = false;
        }
    }

    /// Fold an inbound message into the roster entry for `counterparty`.
    ///
    /// Updates preview, timestamp, and unread count, then moves the entry to
    /// the front. An unknown counterparty is inserted at the front with a
    /// placeholder name; the caller should fetch the profile to fill it in.
    ///
    /// Returns `true` if a placeholder entry was inserted.
    pub fn apply_push(
        &mut self,
        counterparty: UserId,
        message: &ChatMessage,
        increment_unread: bool,
    ) -> bool {
        if let Some(index) = self.conversations.iter().position(|c| c.user_id == counterparty) {
            let mut entry = self.conversations.remove(index);
            entry.last_message = message.content.clone();
            entry.last_message_time = Some(message.timestamp);
            if increment_unread {
                entry.unread_count += 1;
            }
            self.conversations.insert(0, entry);
            return false;
        }

        self.conversations.insert(0, Conversation {
            user_id: counterparty,
            name: String::new(),
            profile_picture: None,
            last_message: message.content.clone(),
            last_message_time: Some(message.timestamp),
            unread_count: u32::from(increment_unread),
            online: false,
        });
        true
    }

    /// Substitute the preview of any conversation whose last message matched
    /// deleted content.
    pub fn apply_deleted(&mut self, content: &str) {
        for conversation in &mut self.conversations {
            if conversation.last_message == content {
                conversation.last_message = "Message deleted".to_string();
            }
        }
    }

    /// Fill in display fields of a placeholder entry from a fetched profile.
    pub fn fill_profile(&mut self, profile: &CounterpartyProfile) {
        if let Some(entry) =
            self.conversations.iter_mut().find(|c| c.user_id == profile.user_id)
            && entry.name.is_empty()
        {
            entry.name = profile.display_name();
            entry.profile_picture = profile.profile_picture.clone();
            entry.online = profile.online;
        }
    }

    /// Insert a conversation at the front unless the counterparty is already
    /// present. Guards the race where two effects observe the same deep link.
    ///
    /// Returns `true` if the conversation was inserted.
    pub fn insert_front_if_absent(&mut self, conversation: Conversation) -> bool {
        if self.get(conversation.user_id).is_some() {
            return false;
        }
        self.conversations.insert(0, conversation);
        true
    }

    /// Zero the unread count of one conversation.
    pub fn zero_unread(&mut self, user_id: UserId) {
        if let Some(entry) = self.conversations.iter_mut().find(|c| c.user_id == user_id) {
            entry.unread_count = 0;
        }
    }

    /// Remove a conversation entirely (optimistic conversation delete).
    pub fn remove(&mut self, user_id: UserId) {
        self.conversations.retain(|c| c.user_id != user_id);
    }

    fn request_for(&self, page: u32) -> PageRequest {
        PageRequest {
            page,
            size: self.page_size,
            search: self.search.clone(),
            unread_only: self.filter == RosterFilter::UnreadOnly,
            generation: self.generation,
        }
    }
}

/// Keep the first occurrence of each `user_id`, dropping later duplicates
/// silently.
fn dedup_by_user(conversations: Vec<Conversation>) -> Vec<Conversation> {
    let mut seen = HashSet::new();
    conversations.into_iter().filter(|c| seen.insert(c.user_id)).collect()
}
