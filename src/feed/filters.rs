// SPDX-License-Identifier: MPL-2.0

//! Filters the tuner runs over each page, in the order the caller configures.

use crate::atproto::ProfileViewBasic;
use crate::feed::lang::is_post_in_language;
use crate::feed::slice::{FeedSlice, SliceAuthors};
use crate::feed::tuner::PendingSeen;

/// A configured tuning pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunerFn {
    RemoveReplies,
    RemoveReposts,
    RemoveQuotePosts,
    RemoveOrphans,
    RemoveMutedThreads,
    DedupThreads,
    FollowedRepliesOnly { user_did: String },
    PreferredLangOnly { langs: Vec<String> },
}

impl TunerFn {
    pub fn followed_replies_only(user_did: impl Into<String>) -> Self {
        Self::FollowedRepliesOnly {
            user_did: user_did.into(),
        }
    }

    pub fn preferred_lang_only<I, S>(langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PreferredLangOnly {
            langs: langs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TunerFn::RemoveReplies => "remove_replies",
            TunerFn::RemoveReposts => "remove_reposts",
            TunerFn::RemoveQuotePosts => "remove_quote_posts",
            TunerFn::RemoveOrphans => "remove_orphans",
            TunerFn::RemoveMutedThreads => "remove_muted_threads",
            TunerFn::DedupThreads => "dedup_threads",
            TunerFn::FollowedRepliesOnly { .. } => "followed_replies_only",
            TunerFn::PreferredLangOnly { .. } => "preferred_lang_only",
        }
    }

    /// Run this pass. Only `DedupThreads` touches the seen state.
    pub fn apply(&self, seen: &mut PendingSeen<'_>, slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
        match self {
            TunerFn::RemoveReplies => remove_replies(slices),
            TunerFn::RemoveReposts => remove_reposts(slices),
            TunerFn::RemoveQuotePosts => remove_quote_posts(slices),
            TunerFn::RemoveOrphans => remove_orphans(slices),
            TunerFn::RemoveMutedThreads => remove_muted_threads(slices),
            TunerFn::DedupThreads => dedup_threads(seen, slices),
            TunerFn::FollowedRepliesOnly { user_did } => followed_replies_only(user_did, slices),
            TunerFn::PreferredLangOnly { langs } => preferred_lang_only(langs, slices),
        }
    }
}

/// Drop replies, except reposted ones and self-threads.
pub fn remove_replies(mut slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    slices.retain(|slice| !slice.is_reply() || slice.is_repost() || slice.authors().is_self_thread());
    slices
}

pub fn remove_reposts(mut slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    slices.retain(|slice| !slice.is_repost());
    slices
}

pub fn remove_quote_posts(mut slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    slices.retain(|slice| !slice.is_quote_post());
    slices
}

pub fn remove_orphans(mut slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    slices.retain(|slice| !slice.is_orphan());
    slices
}

pub fn remove_muted_threads(mut slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    slices.retain(|slice| !slice.is_thread_muted());
    slices
}

/// Keep one non-repost slice per thread root. Reposts always pass, and
/// every kept root is recorded.
pub fn dedup_threads(seen: &mut PendingSeen<'_>, mut slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    slices.retain(|slice| {
        if !slice.is_repost() && seen.has_root_uri(slice.root_uri()) {
            return false;
        }
        seen.mark_root_uri(slice.root_uri());
        true
    });
    slices
}

/// Keep replies only when they connect to the viewer's network.
pub fn followed_replies_only(user_did: &str, mut slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    slices.retain(|slice| {
        !slice.is_reply()
            || slice.is_repost()
            || should_display_reply_in_following(&slice.authors(), user_did)
    });
    slices
}

/// Keep slices with at least one item in a preferred language. If none
/// match, the page is returned untouched rather than left blank.
pub fn preferred_lang_only(langs: &[String], slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    if langs.is_empty() {
        return slices;
    }

    let matches: Vec<bool> = slices
        .iter()
        .map(|slice| {
            slice
                .items()
                .iter()
                .any(|item| is_post_in_language(&item.record, langs))
        })
        .collect();

    if !matches.contains(&true) {
        return slices;
    }

    slices
        .into_iter()
        .zip(matches)
        .filter_map(|(slice, keep)| keep.then_some(slice))
        .collect()
}

fn is_self_or_following(profile: &ProfileViewBasic, user_did: &str) -> bool {
    profile.did == user_did || profile.is_followed()
}

/// Self-threads always show. Otherwise one ancestor by someone other than
/// the leaf's author must be the viewer or someone they follow.
fn should_display_reply_in_following(authors: &SliceAuthors<'_>, user_did: &str) -> bool {
    if authors.is_self_thread() {
        return true;
    }
    authors
        .ancestors()
        .filter(|ancestor| ancestor.did != authors.author.did)
        .any(|ancestor| is_self_or_following(ancestor, user_did))
}
