// SPDX-License-Identifier: MPL-2.0

//! Wire types for the parts of the `app.bsky.*` lexicons the feed layer reads.
//!
//! These are our own serde structs rather than the SDK's generated ones, so the
//! rest of the crate owns the API boundary. Unions are closed enums keyed on
//! `$type`; members we don't model land in an `Unknown` variant instead of
//! failing the whole page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoupled from atrium's internal representation so we own the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub did: String,
    pub handle: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorViewerState {
    pub muted: Option<bool>,
    pub blocked_by: Option<bool>,
    /// URI of the viewer's block record, if they block this actor
    pub blocking: Option<String>,
    /// URI of the viewer's follow record, if they follow this actor
    pub following: Option<String>,
    pub followed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileViewBasic {
    pub did: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub viewer: Option<ActorViewerState>,
}

impl ProfileViewBasic {
    /// Whether the viewer follows this actor.
    pub fn is_followed(&self) -> bool {
        self.viewer
            .as_ref()
            .is_some_and(|v| v.following.is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostViewerState {
    pub like: Option<String>,
    pub repost: Option<String>,
    pub thread_muted: Option<bool>,
    pub reply_disabled: Option<bool>,
    pub embedding_disabled: Option<bool>,
    pub pinned: Option<bool>,
}

/// `app.bsky.feed.defs#postView`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: ProfileViewBasic,
    /// Raw record; validated into a `PostRecord` where it matters.
    #[serde(default)]
    pub record: Value,
    pub embed: Option<EmbedView>,
    pub reply_count: Option<u64>,
    pub repost_count: Option<u64>,
    pub like_count: Option<u64>,
    pub quote_count: Option<u64>,
    pub indexed_at: String,
    pub viewer: Option<PostViewerState>,
}

impl PostView {
    pub fn is_thread_muted(&self) -> bool {
        self.viewer
            .as_ref()
            .and_then(|v| v.thread_muted)
            .unwrap_or(false)
    }

    pub fn is_embedding_disabled(&self) -> bool {
        self.viewer
            .as_ref()
            .and_then(|v| v.embedding_disabled)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundPost {
    pub uri: String,
    #[serde(default)]
    pub not_found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedAuthor {
    pub did: String,
    pub viewer: Option<ActorViewerState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedPost {
    pub uri: String,
    #[serde(default)]
    pub blocked: bool,
    pub author: BlockedAuthor,
}

/// Root or parent of a reply as hydrated by the AppView.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "$type")]
pub enum ReplyNode {
    #[serde(rename = "app.bsky.feed.defs#postView")]
    Post(Box<PostView>),
    #[serde(rename = "app.bsky.feed.defs#notFoundPost")]
    NotFound(NotFoundPost),
    #[serde(rename = "app.bsky.feed.defs#blockedPost")]
    Blocked(BlockedPost),
    #[serde(other)]
    Unknown,
}

impl ReplyNode {
    pub fn uri(&self) -> Option<&str> {
        match self {
            ReplyNode::Post(post) => Some(&post.uri),
            ReplyNode::NotFound(post) => Some(&post.uri),
            ReplyNode::Blocked(post) => Some(&post.uri),
            ReplyNode::Unknown => None,
        }
    }

    pub fn as_post(&self) -> Option<&PostView> {
        match self {
            ReplyNode::Post(post) => Some(post),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, ReplyNode::Blocked(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReplyNode::NotFound(_))
    }
}

/// `app.bsky.feed.defs#replyRef`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRef {
    pub root: ReplyNode,
    pub parent: ReplyNode,
    /// Author of the parent's parent, when the AppView could hydrate it
    pub grandparent_author: Option<ProfileViewBasic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonRepost {
    pub by: ProfileViewBasic,
    pub indexed_at: String,
    pub uri: Option<String>,
    pub cid: Option<String>,
}

/// Why an item appears in a feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "$type")]
pub enum FeedReason {
    #[serde(rename = "app.bsky.feed.defs#reasonRepost")]
    Repost(ReasonRepost),
    #[serde(rename = "app.bsky.feed.defs#reasonPin")]
    Pin,
    #[serde(other)]
    Unknown,
}

/// Client-side attribution attached when items from several feeds are merged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReasonFeedSource {
    pub uri: String,
    pub href: String,
}

/// `app.bsky.feed.defs#feedViewPost`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedViewPost {
    pub post: PostView,
    pub reply: Option<ReplyRef>,
    pub reason: Option<FeedReason>,
    pub feed_context: Option<String>,
    pub req_id: Option<String>,
    #[serde(rename = "__source")]
    pub source: Option<ReasonFeedSource>,
}

/// One page of any feed endpoint (timeline, feed generator, author, list).
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPage {
    pub feed: Vec<FeedViewPost>,
    pub cursor: Option<String>,
}

// ─── Embed views ───

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AspectRatio {
    pub width: u64,
    pub height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewImage {
    pub thumb: String,
    pub fullsize: String,
    #[serde(default)]
    pub alt: String,
    pub aspect_ratio: Option<AspectRatio>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImagesView {
    pub images: Vec<ViewImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewExternal {
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub thumb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalView {
    pub external: ViewExternal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub cid: String,
    pub playlist: String,
    pub thumbnail: Option<String>,
    pub alt: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
}

/// `app.bsky.embed.record#viewRecord`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    pub uri: String,
    pub cid: String,
    pub author: ProfileViewBasic,
    #[serde(default)]
    pub value: Value,
    pub embeds: Option<Vec<EmbedView>>,
    pub like_count: Option<u64>,
    pub reply_count: Option<u64>,
    pub repost_count: Option<u64>,
    pub quote_count: Option<u64>,
    pub indexed_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNotFound {
    pub uri: String,
    #[serde(default)]
    pub not_found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewBlocked {
    pub uri: String,
    #[serde(default)]
    pub blocked: bool,
    pub author: BlockedAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewDetached {
    pub uri: String,
    #[serde(default)]
    pub detached: bool,
}

/// `app.bsky.feed.defs#generatorView`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorView {
    pub uri: String,
    pub cid: String,
    pub did: String,
    pub creator: ProfileViewBasic,
    pub display_name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub like_count: Option<u64>,
    pub indexed_at: String,
}

/// `app.bsky.graph.defs#listView`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub uri: String,
    pub cid: String,
    pub creator: ProfileViewBasic,
    pub name: String,
    pub purpose: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub list_item_count: Option<u64>,
    pub indexed_at: String,
}

/// `app.bsky.labeler.defs#labelerView`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelerView {
    pub uri: String,
    pub cid: String,
    pub creator: ProfileViewBasic,
    pub like_count: Option<u64>,
    pub indexed_at: String,
}

/// `app.bsky.graph.defs#starterPackViewBasic`; also read from the full
/// `starterPackView`, whose extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterPackViewBasic {
    pub uri: String,
    pub cid: String,
    #[serde(default)]
    pub record: Value,
    pub creator: ProfileViewBasic,
    pub list_item_count: Option<u64>,
    pub joined_all_time_count: Option<u64>,
    pub indexed_at: String,
}

/// The `record` member of an `app.bsky.embed.record#view`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "$type")]
pub enum RecordViewRecord {
    #[serde(rename = "app.bsky.embed.record#viewRecord")]
    Record(Box<ViewRecord>),
    #[serde(rename = "app.bsky.embed.record#viewNotFound")]
    NotFound(ViewNotFound),
    #[serde(rename = "app.bsky.embed.record#viewBlocked")]
    Blocked(ViewBlocked),
    #[serde(rename = "app.bsky.embed.record#viewDetached")]
    Detached(ViewDetached),
    #[serde(rename = "app.bsky.feed.defs#generatorView")]
    Generator(Box<GeneratorView>),
    #[serde(rename = "app.bsky.graph.defs#listView")]
    List(Box<ListView>),
    #[serde(rename = "app.bsky.labeler.defs#labelerView")]
    Labeler(Box<LabelerView>),
    #[serde(rename = "app.bsky.graph.defs#starterPackViewBasic")]
    StarterPack(Box<StarterPackViewBasic>),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordView {
    pub record: RecordViewRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordWithMediaView {
    pub record: RecordView,
    pub media: Box<EmbedView>,
}

/// Hydrated embed attached to a post view.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "$type")]
pub enum EmbedView {
    #[serde(rename = "app.bsky.embed.images#view")]
    Images(ImagesView),
    #[serde(rename = "app.bsky.embed.external#view")]
    External(ExternalView),
    #[serde(rename = "app.bsky.embed.video#view")]
    Video(VideoView),
    #[serde(rename = "app.bsky.embed.record#view")]
    Record(RecordView),
    #[serde(rename = "app.bsky.embed.recordWithMedia#view")]
    RecordWithMedia(RecordWithMediaView),
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_union_members_do_not_fail_the_item() {
        let item: FeedViewPost = serde_json::from_value(json!({
            "post": {
                "uri": "at://did:plc:alice/app.bsky.feed.post/1",
                "cid": "bafypost1",
                "author": { "did": "did:plc:alice", "handle": "alice.test" },
                "record": {},
                "embed": { "$type": "app.bsky.embed.hologram#view", "depth": 3 },
                "indexedAt": "2024-05-01T12:00:00.000Z"
            },
            "reason": { "$type": "app.bsky.feed.defs#reasonTelepathy" }
        }))
        .unwrap();

        assert!(matches!(item.post.embed, Some(EmbedView::Unknown)));
        assert_eq!(item.reason, Some(FeedReason::Unknown));
    }

    #[test]
    fn test_reply_nodes() {
        let reply: ReplyRef = serde_json::from_value(json!({
            "root": {
                "$type": "app.bsky.feed.defs#blockedPost",
                "uri": "at://did:plc:carol/app.bsky.feed.post/1",
                "blocked": true,
                "author": { "did": "did:plc:carol" }
            },
            "parent": {
                "$type": "app.bsky.feed.defs#notFoundPost",
                "uri": "at://did:plc:bob/app.bsky.feed.post/2",
                "notFound": true
            }
        }))
        .unwrap();

        assert!(reply.root.is_blocked());
        assert!(reply.parent.is_not_found());
        assert_eq!(
            reply.parent.uri(),
            Some("at://did:plc:bob/app.bsky.feed.post/2")
        );
        assert!(reply.parent.as_post().is_none());
        assert!(reply.grandparent_author.is_none());
    }

    #[test]
    fn test_source_attribution_is_read_from_double_underscore_field() {
        let item: FeedViewPost = serde_json::from_value(json!({
            "post": {
                "uri": "at://did:plc:alice/app.bsky.feed.post/1",
                "cid": "bafypost1",
                "author": { "did": "did:plc:alice", "handle": "alice.test" },
                "record": {},
                "indexedAt": "2024-05-01T12:00:00.000Z"
            },
            "__source": {
                "uri": "at://did:plc:feeds/app.bsky.feed.generator/cats",
                "href": "/profile/feeds.test/feed/cats"
            }
        }))
        .unwrap();

        let source = item.source.unwrap();
        assert_eq!(source.href, "/profile/feeds.test/feed/cats");
    }
}
