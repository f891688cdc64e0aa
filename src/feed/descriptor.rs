// SPDX-License-Identifier: MPL-2.0

//! Feed descriptors, the `kind|param|...` strings that identify a feed, and
//! the filter chain each kind of feed is tuned with.

use std::fmt;
use std::str::FromStr;

use crate::feed::filters::TunerFn;
use crate::state::FeedSettings;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Empty feed descriptor")]
    Empty,

    #[error("Unknown feed kind: {0}")]
    UnknownKind(String),

    #[error("Feed descriptor {0:?} is missing a parameter")]
    MissingParam(String),
}

/// Author feed filter, as the `getAuthorFeed` endpoint names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorFilter {
    PostsWithReplies,
    PostsNoReplies,
    PostsWithMedia,
    PostsAndAuthorThreads,
    PostsWithVideo,
    Other(String),
}

impl AuthorFilter {
    pub fn as_str(&self) -> &str {
        match self {
            AuthorFilter::PostsWithReplies => "posts_with_replies",
            AuthorFilter::PostsNoReplies => "posts_no_replies",
            AuthorFilter::PostsWithMedia => "posts_with_media",
            AuthorFilter::PostsAndAuthorThreads => "posts_and_author_threads",
            AuthorFilter::PostsWithVideo => "posts_with_video",
            AuthorFilter::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for AuthorFilter {
    fn from(s: &str) -> Self {
        match s {
            "posts_with_replies" => AuthorFilter::PostsWithReplies,
            "posts_no_replies" => AuthorFilter::PostsNoReplies,
            "posts_with_media" => AuthorFilter::PostsWithMedia,
            "posts_and_author_threads" => AuthorFilter::PostsAndAuthorThreads,
            "posts_with_video" => AuthorFilter::PostsWithVideo,
            other => AuthorFilter::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedDescriptor {
    Following,
    Author { actor: String, filter: AuthorFilter },
    FeedGenerator { uri: String },
    Likes { actor: String },
    List { uri: String },
    Posts { uris: Vec<String> },
    Demo,
}

impl FeedDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedDescriptor::Following => "following",
            FeedDescriptor::Author { .. } => "author",
            FeedDescriptor::FeedGenerator { .. } => "feedgen",
            FeedDescriptor::Likes { .. } => "likes",
            FeedDescriptor::List { .. } => "list",
            FeedDescriptor::Posts { .. } => "posts",
            FeedDescriptor::Demo => "demo",
        }
    }
}

impl FromStr for FeedDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DescriptorError::Empty);
        }

        let mut parts = s.split('|');
        let kind = parts.next().unwrap_or_default();
        let mut param = || {
            parts
                .next()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| DescriptorError::MissingParam(s.to_string()))
        };

        let descriptor = match kind {
            "following" => FeedDescriptor::Following,
            "demo" => FeedDescriptor::Demo,
            "author" => {
                let actor = param()?.to_string();
                let filter = param()?.into();
                FeedDescriptor::Author { actor, filter }
            }
            "feedgen" => FeedDescriptor::FeedGenerator {
                uri: param()?.to_string(),
            },
            "likes" => FeedDescriptor::Likes {
                actor: param()?.to_string(),
            },
            "list" => FeedDescriptor::List {
                uri: param()?.to_string(),
            },
            "posts" => FeedDescriptor::Posts {
                uris: param()?
                    .split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(String::from)
                    .collect(),
            },
            other => return Err(DescriptorError::UnknownKind(other.to_string())),
        };
        Ok(descriptor)
    }
}

impl fmt::Display for FeedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedDescriptor::Following => write!(f, "following"),
            FeedDescriptor::Demo => write!(f, "demo"),
            FeedDescriptor::Author { actor, filter } => {
                write!(f, "author|{actor}|{}", filter.as_str())
            }
            FeedDescriptor::FeedGenerator { uri } => write!(f, "feedgen|{uri}"),
            FeedDescriptor::Likes { actor } => write!(f, "likes|{actor}"),
            FeedDescriptor::List { uri } => write!(f, "list|{uri}"),
            FeedDescriptor::Posts { uris } => write!(f, "posts|{}", uris.join(",")),
        }
    }
}

/// The filter chain a feed is tuned with, given the viewer's preferences.
pub fn tuners_for(
    descriptor: &FeedDescriptor,
    settings: &FeedSettings,
    user_did: &str,
) -> Vec<TunerFn> {
    match descriptor {
        FeedDescriptor::Author {
            filter: AuthorFilter::PostsWithReplies,
            ..
        } => vec![TunerFn::RemoveReposts],
        FeedDescriptor::FeedGenerator { .. } => vec![
            TunerFn::preferred_lang_only(settings.content_languages.iter().cloned()),
            TunerFn::RemoveMutedThreads,
        ],
        FeedDescriptor::Following | FeedDescriptor::List { .. } => {
            let mut tuners = vec![TunerFn::RemoveOrphans];
            if settings.hide_reposts {
                tuners.push(TunerFn::RemoveReposts);
            }
            if settings.hide_replies {
                tuners.push(TunerFn::RemoveReplies);
            } else {
                tuners.push(TunerFn::followed_replies_only(user_did));
            }
            if settings.hide_quote_posts {
                tuners.push(TunerFn::RemoveQuotePosts);
            }
            tuners.push(TunerFn::DedupThreads);
            tuners.push(TunerFn::RemoveMutedThreads);
            tuners
        }
        _ => Vec::new(),
    }
}
