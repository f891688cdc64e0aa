// SPDX-License-Identifier: MPL-2.0

//! Classifying pasted links: web app URLs and `at://` URIs that point at a
//! record, versus everything else.

use url::Url;

use crate::atproto::record::{
    FEED_GENERATOR_COLLECTION, LIST_COLLECTION, POST_COLLECTION, STARTER_PACK_COLLECTION,
};
use crate::config::{BSKY_APP_HOSTS, SHORT_LINK_HOST};

/// The kind of record a link can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Post,
    Feed,
    List,
    StarterPack,
}

impl RecordKind {
    pub fn collection(self) -> &'static str {
        match self {
            RecordKind::Post => POST_COLLECTION,
            RecordKind::Feed => FEED_GENERATOR_COLLECTION,
            RecordKind::List => LIST_COLLECTION,
            RecordKind::StarterPack => STARTER_PACK_COLLECTION,
        }
    }

    fn from_collection(collection: &str) -> Option<Self> {
        match collection {
            POST_COLLECTION => Some(RecordKind::Post),
            FEED_GENERATOR_COLLECTION => Some(RecordKind::Feed),
            LIST_COLLECTION => Some(RecordKind::List),
            STARTER_PACK_COLLECTION => Some(RecordKind::StarterPack),
            _ => None,
        }
    }
}

/// Where a link points once classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Record {
        kind: RecordKind,
        /// Handle or DID, as it appeared in the link
        actor: String,
        rkey: String,
    },
    External(Url),
}

pub fn is_short_link(uri: &str) -> bool {
    Url::parse(uri)
        .ok()
        .is_some_and(|url| url.host_str() == Some(SHORT_LINK_HOST))
}

pub fn is_bsky_app_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url
            .host_str()
            .is_some_and(|host| BSKY_APP_HOSTS.contains(&host))
}

pub fn make_record_uri(actor: &str, collection: &str, rkey: &str) -> String {
    format!("at://{actor}/{collection}/{rkey}")
}

/// Classify a URL or `at://` URI. `None` means it is neither a record link
/// nor a fetchable web URL.
pub fn classify(uri: &str) -> Option<LinkTarget> {
    if let Some(rest) = uri.strip_prefix("at://") {
        return classify_at_uri(rest);
    }

    let url = Url::parse(uri).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if is_bsky_app_url(&url) {
        if let Some(target) = classify_app_path(&url) {
            return Some(target);
        }
    }
    Some(LinkTarget::External(url))
}

fn record(kind: RecordKind, actor: &str, rkey: &str) -> Option<LinkTarget> {
    if actor.is_empty() || rkey.is_empty() {
        return None;
    }
    Some(LinkTarget::Record {
        kind,
        actor: actor.to_string(),
        rkey: rkey.to_string(),
    })
}

fn classify_app_path(url: &Url) -> Option<LinkTarget> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["profile", actor, "post", rkey] => record(RecordKind::Post, actor, rkey),
        ["profile", actor, "feed", rkey] => record(RecordKind::Feed, actor, rkey),
        ["profile", actor, "lists", rkey] => record(RecordKind::List, actor, rkey),
        ["starter-pack", actor, rkey] | ["start", actor, rkey] => {
            record(RecordKind::StarterPack, actor, rkey)
        }
        _ => None,
    }
}

/// `authority/collection/rkey`, the part after `at://`.
fn classify_at_uri(rest: &str) -> Option<LinkTarget> {
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let mut parts = rest.split('/');
    let (Some(actor), Some(collection), Some(rkey), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    record(RecordKind::from_collection(collection)?, actor, rkey)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(kind: RecordKind, actor: &str, rkey: &str) -> Option<LinkTarget> {
        Some(LinkTarget::Record {
            kind,
            actor: actor.into(),
            rkey: rkey.into(),
        })
    }

    #[test]
    fn test_short_links() {
        assert!(is_short_link("https://go.bsky.app/AbCd"));
        assert!(!is_short_link("https://bsky.app/profile/alice.test"));
        assert!(!is_short_link("not a url"));
    }

    #[test]
    fn test_app_urls() {
        assert_eq!(
            classify("https://bsky.app/profile/alice.test/post/3k2a"),
            target(RecordKind::Post, "alice.test", "3k2a")
        );
        assert_eq!(
            classify("https://bsky.app/profile/did:plc:abc/feed/whats-hot/"),
            target(RecordKind::Feed, "did:plc:abc", "whats-hot")
        );
        assert_eq!(
            classify("https://staging.bsky.app/profile/alice.test/lists/3l"),
            target(RecordKind::List, "alice.test", "3l")
        );
        assert_eq!(
            classify("https://bsky.app/starter-pack/alice.test/3sp"),
            target(RecordKind::StarterPack, "alice.test", "3sp")
        );
        assert_eq!(
            classify("https://bsky.app/start/alice.test/3sp"),
            target(RecordKind::StarterPack, "alice.test", "3sp")
        );
    }

    #[test]
    fn test_other_app_paths_are_external() {
        for uri in [
            "https://bsky.app/profile/alice.test",
            "https://bsky.app/profile/alice.test/post",
            "https://bsky.app/search?q=rust",
        ] {
            assert!(matches!(classify(uri), Some(LinkTarget::External(_))), "{uri}");
        }
    }

    #[test]
    fn test_at_uris() {
        assert_eq!(
            classify("at://did:plc:abc/app.bsky.feed.post/3k2a"),
            target(RecordKind::Post, "did:plc:abc", "3k2a")
        );
        assert_eq!(
            classify("at://alice.test/app.bsky.graph.starterpack/3sp"),
            target(RecordKind::StarterPack, "alice.test", "3sp")
        );
        assert_eq!(classify("at://did:plc:abc/app.bsky.feed.like/1"), None);
        assert_eq!(classify("at://did:plc:abc/app.bsky.feed.post"), None);
        assert_eq!(classify("at://did:plc:abc/app.bsky.feed.post/1/extra"), None);
    }

    #[test]
    fn test_external_and_invalid() {
        assert!(matches!(
            classify("https://example.com/article"),
            Some(LinkTarget::External(url)) if url.host_str() == Some("example.com")
        ));
        assert_eq!(classify("mailto:someone@example.com"), None);
        assert_eq!(classify("example.com"), None);
    }

    #[test]
    fn test_make_record_uri() {
        assert_eq!(
            make_record_uri("did:plc:abc", RecordKind::List.collection(), "3l"),
            "at://did:plc:abc/app.bsky.graph.list/3l"
        );
    }
}
