// SPDX-License-Identifier: MPL-2.0

//! One feed entry with its reconstructed thread context.

use crate::atproto::{
    EmbedView, FeedReason, FeedViewPost, PostRecord, PostView, ProfileViewBasic,
    ReasonFeedSource, ReasonRepost, ReplyNode,
};
use crate::config::FALLBACK_MARKER_URI;
use tracing::trace;

/// One post within a slice's thread context.
#[derive(Debug, Clone)]
pub struct FeedSliceItem {
    pub post: PostView,
    pub record: PostRecord,
    pub parent_author: Option<ProfileViewBasic>,
    pub is_parent_blocked: bool,
    pub is_parent_not_found: bool,
}

/// Why a slice is in the feed, merging the wire reason with client-side
/// feed-source attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceReason<'a> {
    Repost(&'a ReasonRepost),
    Pin,
    FeedSource(&'a ReasonFeedSource),
    Unknown,
}

/// Authors around a slice, read from the feed item's reply metadata rather
/// than the reconstructed items, so truncated threads still report them.
#[derive(Debug, Clone, Copy)]
pub struct SliceAuthors<'a> {
    pub author: &'a ProfileViewBasic,
    pub parent_author: Option<&'a ProfileViewBasic>,
    pub grandparent_author: Option<&'a ProfileViewBasic>,
    pub root_author: Option<&'a ProfileViewBasic>,
}

impl<'a> SliceAuthors<'a> {
    /// Ancestor authors that could be hydrated, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a ProfileViewBasic> {
        [self.parent_author, self.grandparent_author, self.root_author]
            .into_iter()
            .flatten()
    }

    /// Every known ancestor was written by the leaf's author.
    pub fn is_self_thread(&self) -> bool {
        self.ancestors().all(|a| a.did == self.author.did)
    }
}

/// A feed entry: 1-3 items ordered `[root, parent, leaf]`.
///
/// Classification flags are fixed at construction. The only later change is
/// the tuner trimming already-seen ancestors off the front of `items`.
#[derive(Debug, Clone)]
pub struct FeedSlice {
    key: String,
    items: Vec<FeedSliceItem>,
    is_incomplete_thread: bool,
    is_fallback_marker: bool,
    is_orphan: bool,
    is_thread_muted: bool,
    root_uri: String,
    feed_post_uri: String,
    feed_post: FeedViewPost,
}

#[derive(Default)]
struct Thread {
    items: Vec<FeedSliceItem>,
    is_fallback_marker: bool,
    is_orphan: bool,
    is_incomplete_thread: bool,
}

impl FeedSlice {
    pub fn new(feed_post: FeedViewPost) -> Self {
        let post = &feed_post.post;
        // Blocked and missing roots still carry their URI.
        let root_uri = feed_post
            .reply
            .as_ref()
            .and_then(|r| r.root.uri())
            .unwrap_or(post.uri.as_str())
            .to_string();
        let timestamp = match &feed_post.reason {
            Some(FeedReason::Repost(repost)) => &repost.indexed_at,
            _ => &post.indexed_at,
        };
        let key = format!("slice-{}-{}", post.uri, timestamp);
        let is_thread_muted = post.is_thread_muted();
        let feed_post_uri = post.uri.clone();

        let thread = reconstruct(&feed_post);

        Self {
            key,
            items: thread.items,
            is_incomplete_thread: thread.is_incomplete_thread,
            is_fallback_marker: thread.is_fallback_marker,
            is_orphan: thread.is_orphan,
            is_thread_muted,
            root_uri,
            feed_post_uri,
            feed_post,
        }
    }

    /// Stable identity for list rendering and session dedup.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn items(&self) -> &[FeedSliceItem] {
        &self.items
    }

    /// The surfaced post, if the slice has any items.
    pub fn leaf(&self) -> Option<&FeedSliceItem> {
        self.items.last()
    }

    pub fn is_incomplete_thread(&self) -> bool {
        self.is_incomplete_thread
    }

    pub fn is_fallback_marker(&self) -> bool {
        self.is_fallback_marker
    }

    pub fn is_orphan(&self) -> bool {
        self.is_orphan
    }

    pub fn is_thread_muted(&self) -> bool {
        self.is_thread_muted
    }

    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    pub fn feed_post_uri(&self) -> &str {
        &self.feed_post_uri
    }

    pub fn feed_post(&self) -> &FeedViewPost {
        &self.feed_post
    }

    pub fn is_quote_post(&self) -> bool {
        matches!(
            self.feed_post.post.embed,
            Some(EmbedView::Record(_) | EmbedView::RecordWithMedia(_))
        )
    }

    pub fn is_reply(&self) -> bool {
        PostRecord::declares_reply(&self.feed_post.post.record)
    }

    pub fn is_repost(&self) -> bool {
        matches!(self.feed_post.reason, Some(FeedReason::Repost(_)))
    }

    pub fn reason(&self) -> Option<SliceReason<'_>> {
        if let Some(source) = &self.feed_post.source {
            return Some(SliceReason::FeedSource(source));
        }
        self.feed_post.reason.as_ref().map(|reason| match reason {
            FeedReason::Repost(repost) => SliceReason::Repost(repost),
            FeedReason::Pin => SliceReason::Pin,
            FeedReason::Unknown => SliceReason::Unknown,
        })
    }

    pub fn feed_context(&self) -> Option<&str> {
        self.feed_post.feed_context.as_deref()
    }

    pub fn req_id(&self) -> Option<&str> {
        self.feed_post.req_id.as_deref()
    }

    pub fn like_count(&self) -> u64 {
        self.feed_post.post.like_count.unwrap_or(0)
    }

    pub fn contains_uri(&self, uri: &str) -> bool {
        self.items.iter().any(|item| item.post.uri == uri)
    }

    pub fn authors(&self) -> SliceAuthors<'_> {
        let reply = self.feed_post.reply.as_ref();
        SliceAuthors {
            author: &self.feed_post.post.author,
            parent_author: reply.and_then(|r| r.parent.as_post()).map(|p| &p.author),
            grandparent_author: reply.and_then(|r| r.grandparent_author.as_ref()),
            root_author: reply.and_then(|r| r.root.as_post()).map(|p| &p.author),
        }
    }

    pub(crate) fn trim_front(&mut self, count: usize) {
        self.items.drain(..count.min(self.items.len()));
    }
}

fn valid_record(post: &PostView) -> Option<PostRecord> {
    match PostRecord::from_value(&post.record) {
        Ok(record) => Some(record),
        Err(e) => {
            trace!(uri = %post.uri, error = %e, "skipping invalid post record");
            None
        }
    }
}

/// Rebuild `[root?, parent?, leaf]` from a feed item.
///
/// The checks run in a fixed order; each one assumes the earlier ones passed.
fn reconstruct(feed_post: &FeedViewPost) -> Thread {
    let mut thread = Thread::default();
    let post = &feed_post.post;

    if post.uri == FALLBACK_MARKER_URI {
        thread.is_fallback_marker = true;
        return thread;
    }

    let Some(record) = valid_record(post) else {
        return thread;
    };
    let declares_reply = record.reply.is_some();

    let parent = feed_post.reply.as_ref().map(|r| &r.parent);
    thread.items.push(FeedSliceItem {
        post: post.clone(),
        record,
        parent_author: parent.and_then(ReplyNode::as_post).map(|p| p.author.clone()),
        is_parent_blocked: parent.is_some_and(ReplyNode::is_blocked),
        is_parent_not_found: parent.is_some_and(ReplyNode::is_not_found),
    });

    let Some(reply) = &feed_post.reply else {
        if declares_reply {
            // The AppView failed to hydrate this reply's context.
            thread.is_orphan = true;
            thread.items[0].is_parent_not_found = true;
        }
        return thread;
    };

    // Reposts and feed-sourced items stand alone, without their thread.
    if feed_post.reason.is_some() || feed_post.source.is_some() {
        return thread;
    }

    let Some((parent, parent_record)) = reply
        .parent
        .as_post()
        .and_then(|p| valid_record(p).map(|r| (p, r)))
    else {
        thread.is_orphan = true;
        return thread;
    };
    let parent_parent_uri = parent_record.parent_uri().map(String::from);

    // When the parent replies directly to the root, the root doubles as the
    // grandparent and tells us whether that level is blocked or missing.
    // Deeper threads never get this information.
    let grandparent = reply
        .root
        .uri()
        .filter(|root_uri| parent_parent_uri.as_deref() == Some(*root_uri))
        .map(|_| &reply.root);
    let is_grandparent_blocked = grandparent.is_some_and(ReplyNode::is_blocked);
    let is_grandparent_not_found = grandparent.is_some_and(ReplyNode::is_not_found);

    thread.items.insert(
        0,
        FeedSliceItem {
            post: parent.clone(),
            record: parent_record,
            parent_author: reply.grandparent_author.clone(),
            is_parent_blocked: is_grandparent_blocked,
            is_parent_not_found: is_grandparent_not_found,
        },
    );

    // Keep going: the root is still needed for thread dedup.
    if is_grandparent_blocked {
        thread.is_orphan = true;
    }

    let Some((root, root_record)) = reply
        .root
        .as_post()
        .and_then(|p| valid_record(p).map(|r| (p, r)))
    else {
        thread.is_orphan = true;
        return thread;
    };

    if root.uri == parent.uri {
        return thread;
    }

    thread.items.insert(
        0,
        FeedSliceItem {
            post: root.clone(),
            record: root_record,
            parent_author: None,
            is_parent_blocked: false,
            is_parent_not_found: false,
        },
    );

    if parent_parent_uri.as_deref() != Some(root.uri.as_str()) {
        thread.is_incomplete_thread = true;
    }

    thread
}
