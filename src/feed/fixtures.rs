// SPDX-License-Identifier: MPL-2.0

//! JSON builders for feed items, shaped like AppView responses.

use crate::atproto::FeedViewPost;
use serde_json::{Value, json};

pub const INDEXED_AT: &str = "2024-05-01T12:00:00.000Z";

pub fn uri(author: &str, rkey: &str) -> String {
    format!("at://did:plc:{author}/app.bsky.feed.post/{rkey}")
}

pub fn author(name: &str) -> Value {
    json!({ "did": format!("did:plc:{name}"), "handle": format!("{name}.test") })
}

/// A top-level post by `author` with record key `rkey`.
pub fn post(author_name: &str, rkey: &str) -> Value {
    json!({
        "$type": "app.bsky.feed.defs#postView",
        "uri": uri(author_name, rkey),
        "cid": format!("bafy{author_name}{rkey}"),
        "author": author(author_name),
        "record": {
            "$type": "app.bsky.feed.post",
            "text": format!("post {rkey} by {author_name}"),
            "createdAt": INDEXED_AT
        },
        "indexedAt": INDEXED_AT
    })
}

/// A reply whose record points at `root` and `parent` (both post URIs).
pub fn reply(author_name: &str, rkey: &str, root: &str, parent: &str) -> Value {
    let mut value = post(author_name, rkey);
    value["record"]["reply"] = json!({
        "root": { "uri": root, "cid": "bafyroot" },
        "parent": { "uri": parent, "cid": "bafyparent" }
    });
    value
}

pub fn followed(mut post: Value) -> Value {
    post["author"]["viewer"] = json!({ "following": "at://did:plc:me/app.bsky.graph.follow/1" });
    post
}

pub fn with_langs(mut post: Value, langs: &[&str]) -> Value {
    post["record"]["langs"] = json!(langs);
    post
}

pub fn not_found(uri: &str) -> Value {
    json!({ "$type": "app.bsky.feed.defs#notFoundPost", "uri": uri, "notFound": true })
}

pub fn blocked(uri: &str) -> Value {
    json!({
        "$type": "app.bsky.feed.defs#blockedPost",
        "uri": uri,
        "blocked": true,
        "author": { "did": "did:plc:blocker" }
    })
}

pub fn repost_by(name: &str) -> Value {
    json!({
        "$type": "app.bsky.feed.defs#reasonRepost",
        "by": author(name),
        "indexedAt": "2024-05-02T08:30:00.000Z"
    })
}

pub fn item(post: Value) -> FeedViewPost {
    serde_json::from_value(json!({ "post": post })).expect("valid feed item")
}

pub fn reply_item(post: Value, root: Value, parent: Value) -> FeedViewPost {
    serde_json::from_value(json!({
        "post": post,
        "reply": { "root": root, "parent": parent }
    }))
    .expect("valid feed item")
}

pub fn reply_item_with_grandparent(
    post: Value,
    root: Value,
    parent: Value,
    grandparent_author: Value,
) -> FeedViewPost {
    serde_json::from_value(json!({
        "post": post,
        "reply": { "root": root, "parent": parent, "grandparentAuthor": grandparent_author }
    }))
    .expect("valid feed item")
}

pub fn reposted(post: Value, by: &str) -> FeedViewPost {
    serde_json::from_value(json!({ "post": post, "reason": repost_by(by) }))
        .expect("valid feed item")
}

pub fn reposted_reply(post: Value, root: Value, parent: Value, by: &str) -> FeedViewPost {
    serde_json::from_value(json!({
        "post": post,
        "reply": { "root": root, "parent": parent },
        "reason": repost_by(by)
    }))
    .expect("valid feed item")
}

/// A three-level thread `root <- parent <- leaf` with rkeys r, p, l.
pub fn thread(root_author: &str, parent_author: &str, leaf_author: &str) -> FeedViewPost {
    let root = post(root_author, "r");
    let root_uri = uri(root_author, "r");
    let parent = reply(parent_author, "p", &root_uri, &root_uri);
    let parent_uri = uri(parent_author, "p");
    let leaf = reply(leaf_author, "l", &root_uri, &parent_uri);
    reply_item(leaf, root, parent)
}
