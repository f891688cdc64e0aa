// SPDX-License-Identifier: MPL-2.0

//! Flatten the hydrated embed union into one shape per thing we render.

use crate::atproto::types::{
    EmbedView, ExternalView, GeneratorView, ImagesView, LabelerView, ListView, RecordView,
    RecordViewRecord, StarterPackViewBasic, VideoView, ViewBlocked, ViewDetached, ViewNotFound,
    ViewRecord,
};

/// A resolved embed, borrowing from the post view it came from.
#[derive(Debug, Clone)]
pub enum Embed<'a> {
    Post(&'a ViewRecord),
    PostNotFound(&'a ViewNotFound),
    PostBlocked(&'a ViewBlocked),
    PostDetached(&'a ViewDetached),
    Feed(&'a GeneratorView),
    List(&'a ListView),
    Labeler(&'a LabelerView),
    StarterPack(&'a StarterPackViewBasic),
    Images(&'a ImagesView),
    Link(&'a ExternalView),
    Video(&'a VideoView),
    /// A quoted record plus attached media. Only one level deep.
    PostWithMedia {
        view: Box<Embed<'a>>,
        media: Box<Embed<'a>>,
    },
    Unknown,
}

impl Embed<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Embed::Post(_) => "post",
            Embed::PostNotFound(_) => "post_not_found",
            Embed::PostBlocked(_) => "post_blocked",
            Embed::PostDetached(_) => "post_detached",
            Embed::Feed(_) => "feed",
            Embed::List(_) => "list",
            Embed::Labeler(_) => "labeler",
            Embed::StarterPack(_) => "starter_pack",
            Embed::Images(_) => "images",
            Embed::Link(_) => "link",
            Embed::Video(_) => "video",
            Embed::PostWithMedia { .. } => "post_with_media",
            Embed::Unknown => "unknown",
        }
    }
}

/// Resolve the embed of a post view. A missing embed is `Unknown`.
pub fn parse_embed(embed: Option<&EmbedView>) -> Embed<'_> {
    match embed {
        Some(EmbedView::Images(view)) => Embed::Images(view),
        Some(EmbedView::External(view)) => Embed::Link(view),
        Some(EmbedView::Video(view)) => Embed::Video(view),
        Some(EmbedView::Record(view)) => parse_embed_record_view(view),
        Some(EmbedView::RecordWithMedia(view)) => Embed::PostWithMedia {
            view: Box::new(parse_embed_record_view(&view.record)),
            media: Box::new(parse_embed(Some(view.media.as_ref()))),
        },
        Some(EmbedView::Unknown) | None => Embed::Unknown,
    }
}

/// Resolve the record half of a record embed.
pub fn parse_embed_record_view(view: &RecordView) -> Embed<'_> {
    match &view.record {
        RecordViewRecord::Record(record) => Embed::Post(record),
        RecordViewRecord::NotFound(record) => Embed::PostNotFound(record),
        RecordViewRecord::Blocked(record) => Embed::PostBlocked(record),
        RecordViewRecord::Detached(record) => Embed::PostDetached(record),
        RecordViewRecord::Generator(view) => Embed::Feed(view),
        RecordViewRecord::List(view) => Embed::List(view),
        RecordViewRecord::Labeler(view) => Embed::Labeler(view),
        RecordViewRecord::StarterPack(view) => Embed::StarterPack(view),
        RecordViewRecord::Unknown => Embed::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn embed(value: Value) -> EmbedView {
        serde_json::from_value(value).unwrap()
    }

    fn author() -> Value {
        json!({ "did": "did:plc:alice", "handle": "alice.test" })
    }

    fn view_record() -> Value {
        json!({
            "$type": "app.bsky.embed.record#viewRecord",
            "uri": "at://did:plc:alice/app.bsky.feed.post/1",
            "cid": "bafyquoted",
            "author": author(),
            "value": { "$type": "app.bsky.feed.post", "text": "quoted", "createdAt": "2024-05-01T12:00:00Z" },
            "indexedAt": "2024-05-01T12:00:00Z"
        })
    }

    #[test]
    fn test_missing_embed_is_unknown() {
        assert!(matches!(parse_embed(None), Embed::Unknown));
    }

    #[test]
    fn test_images() {
        let view = embed(json!({
            "$type": "app.bsky.embed.images#view",
            "images": [{ "thumb": "https://cdn.test/t.jpg", "fullsize": "https://cdn.test/f.jpg", "alt": "a cat" }]
        }));
        let Embed::Images(images) = parse_embed(Some(&view)) else {
            panic!("expected images");
        };
        assert_eq!(images.images[0].alt, "a cat");
    }

    #[test]
    fn test_external_is_link() {
        let view = embed(json!({
            "$type": "app.bsky.embed.external#view",
            "external": { "uri": "https://example.com", "title": "Example", "description": "" }
        }));
        let parsed = parse_embed(Some(&view));
        assert_eq!(parsed.kind(), "link");
    }

    #[test]
    fn test_record_variants() {
        let cases = [
            (view_record(), "post"),
            (
                json!({ "$type": "app.bsky.embed.record#viewNotFound", "uri": "at://x/app.bsky.feed.post/1", "notFound": true }),
                "post_not_found",
            ),
            (
                json!({ "$type": "app.bsky.embed.record#viewBlocked", "uri": "at://x/app.bsky.feed.post/1", "blocked": true, "author": { "did": "did:plc:x" } }),
                "post_blocked",
            ),
            (
                json!({ "$type": "app.bsky.embed.record#viewDetached", "uri": "at://x/app.bsky.feed.post/1", "detached": true }),
                "post_detached",
            ),
            (
                json!({
                    "$type": "app.bsky.graph.defs#listView",
                    "uri": "at://did:plc:alice/app.bsky.graph.list/l1",
                    "cid": "bafylist",
                    "creator": author(),
                    "name": "Friends",
                    "purpose": "app.bsky.graph.defs#curatelist",
                    "indexedAt": "2024-05-01T12:00:00Z"
                }),
                "list",
            ),
            (
                json!({ "$type": "app.bsky.embed.record#viewTeleport", "uri": "at://x" }),
                "unknown",
            ),
        ];

        for (record, expected) in cases {
            let view = embed(json!({ "$type": "app.bsky.embed.record#view", "record": record }));
            assert_eq!(parse_embed(Some(&view)).kind(), expected);
        }
    }

    #[test]
    fn test_record_with_media_recurses_one_level() {
        let view = embed(json!({
            "$type": "app.bsky.embed.recordWithMedia#view",
            "record": { "record": view_record() },
            "media": {
                "$type": "app.bsky.embed.video#view",
                "cid": "bafyvideo",
                "playlist": "https://video.test/playlist.m3u8"
            }
        }));

        let Embed::PostWithMedia { view, media } = parse_embed(Some(&view)) else {
            panic!("expected post_with_media");
        };
        let Embed::Post(quoted) = *view else {
            panic!("expected quoted post");
        };
        assert_eq!(quoted.cid, "bafyquoted");
        assert_eq!(media.kind(), "video");
    }
}
