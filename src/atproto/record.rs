// SPDX-License-Identifier: MPL-2.0

//! `app.bsky.feed.post` records and their validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

pub const POST_COLLECTION: &str = "app.bsky.feed.post";
pub const FEED_GENERATOR_COLLECTION: &str = "app.bsky.feed.generator";
pub const LIST_COLLECTION: &str = "app.bsky.graph.list";
pub const STARTER_PACK_COLLECTION: &str = "app.bsky.graph.starterpack";

const MAX_TEXT_BYTES: usize = 3000;
const MAX_TEXT_GRAPHEMES: usize = 300;
const MAX_LANGS: usize = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("not a post record (type {0:?})")]
    WrongType(Option<String>),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("text exceeds 3000 bytes")]
    TextTooLong,
    #[error("text exceeds 300 graphemes")]
    TooManyGraphemes,
    #[error("more than 3 languages")]
    TooManyLangs,
    #[error("invalid createdAt: {0}")]
    InvalidCreatedAt(String),
    #[error("invalid reply reference: {0}")]
    InvalidReplyRef(String),
}

/// `com.atproto.repo.strongRef`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

impl StrongRef {
    fn validate(&self) -> Result<(), RecordError> {
        if !self.uri.starts_with("at://") {
            return Err(RecordError::InvalidReplyRef(self.uri.clone()));
        }
        if self.cid.is_empty() {
            return Err(RecordError::InvalidReplyRef(format!(
                "{} has no cid",
                self.uri
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostReplyRef {
    pub root: StrongRef,
    pub parent: StrongRef,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub text: String,
    pub created_at: String,
    pub reply: Option<PostReplyRef>,
    pub embed: Option<Value>,
    pub langs: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl PostRecord {
    /// Cheap shape check: does this value claim to be a post record?
    pub fn is_record(value: &Value) -> bool {
        value.get("$type").and_then(Value::as_str) == Some(POST_COLLECTION)
    }

    /// Whether the value is a post record carrying a reply pointer, without
    /// validating the rest of it.
    pub fn declares_reply(value: &Value) -> bool {
        Self::is_record(value) && value.get("reply").is_some_and(|r| !r.is_null())
    }

    /// Parse and validate a raw record.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        if !Self::is_record(value) {
            let record_type = value
                .get("$type")
                .and_then(Value::as_str)
                .map(String::from);
            return Err(RecordError::WrongType(record_type));
        }
        let record =
            Self::deserialize(value).map_err(|e| RecordError::Malformed(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.text.len() > MAX_TEXT_BYTES {
            return Err(RecordError::TextTooLong);
        }
        if self.text.graphemes(true).count() > MAX_TEXT_GRAPHEMES {
            return Err(RecordError::TooManyGraphemes);
        }
        if self.langs.as_ref().is_some_and(|l| l.len() > MAX_LANGS) {
            return Err(RecordError::TooManyLangs);
        }
        chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| RecordError::InvalidCreatedAt(format!("{}: {e}", self.created_at)))?;
        if let Some(reply) = &self.reply {
            reply.root.validate()?;
            reply.parent.validate()?;
        }
        Ok(())
    }

    /// URI of the post this one replies to, if any.
    pub fn parent_uri(&self) -> Option<&str> {
        self.reply.as_ref().map(|r| r.parent.uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(extra: Value) -> Value {
        let mut value = json!({
            "$type": "app.bsky.feed.post",
            "text": "hello world",
            "createdAt": "2024-05-01T12:00:00.000Z"
        });
        if let (Some(base), Value::Object(extra)) = (value.as_object_mut(), extra) {
            base.extend(extra);
        }
        value
    }

    #[test]
    fn test_valid_record() {
        let parsed = PostRecord::from_value(&record(json!({ "langs": ["en"] }))).unwrap();
        assert_eq!(parsed.text, "hello world");
        assert_eq!(parsed.langs, Some(vec!["en".to_string()]));
        assert!(parsed.parent_uri().is_none());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let value = json!({ "$type": "app.bsky.feed.like", "text": "x", "createdAt": "2024-05-01T12:00:00Z" });
        assert_eq!(
            PostRecord::from_value(&value),
            Err(RecordError::WrongType(Some("app.bsky.feed.like".into())))
        );
        assert_eq!(
            PostRecord::from_value(&Value::Null),
            Err(RecordError::WrongType(None))
        );
    }

    #[test]
    fn test_missing_text_is_malformed() {
        let value = json!({ "$type": "app.bsky.feed.post", "createdAt": "2024-05-01T12:00:00Z" });
        assert!(matches!(
            PostRecord::from_value(&value),
            Err(RecordError::Malformed(_))
        ));
    }

    #[test]
    fn test_text_limits() {
        let long = "a".repeat(301);
        assert_eq!(
            PostRecord::from_value(&record(json!({ "text": long }))),
            Err(RecordError::TooManyGraphemes)
        );

        // 300 graphemes that each take several bytes
        let wide = "👩‍👩‍👧".repeat(300);
        assert_eq!(
            PostRecord::from_value(&record(json!({ "text": wide }))),
            Err(RecordError::TextTooLong)
        );

        let exact = "é".repeat(300);
        assert!(PostRecord::from_value(&record(json!({ "text": exact }))).is_ok());
    }

    #[test]
    fn test_too_many_langs() {
        let value = record(json!({ "langs": ["en", "de", "fr", "ja"] }));
        assert_eq!(
            PostRecord::from_value(&value),
            Err(RecordError::TooManyLangs)
        );
    }

    #[test]
    fn test_bad_created_at() {
        let value = record(json!({ "createdAt": "yesterday" }));
        assert!(matches!(
            PostRecord::from_value(&value),
            Err(RecordError::InvalidCreatedAt(_))
        ));
    }

    #[test]
    fn test_reply_refs() {
        let value = record(json!({
            "reply": {
                "root": { "uri": "at://did:plc:a/app.bsky.feed.post/1", "cid": "bafyroot" },
                "parent": { "uri": "at://did:plc:b/app.bsky.feed.post/2", "cid": "bafyparent" }
            }
        }));
        let parsed = PostRecord::from_value(&value).unwrap();
        assert_eq!(parsed.parent_uri(), Some("at://did:plc:b/app.bsky.feed.post/2"));
        assert!(PostRecord::declares_reply(&value));

        let broken = record(json!({
            "reply": {
                "root": { "uri": "https://example.com", "cid": "bafyroot" },
                "parent": { "uri": "at://did:plc:b/app.bsky.feed.post/2", "cid": "" }
            }
        }));
        assert!(matches!(
            PostRecord::from_value(&broken),
            Err(RecordError::InvalidReplyRef(_))
        ));
        // Shape check alone still sees the reply pointer
        assert!(PostRecord::declares_reply(&broken));
    }
}
