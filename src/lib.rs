// SPDX-License-Identifier: MPL-2.0

//! Bluesky feed tuning: thread reconstruction for feed items, session-wide
//! deduplication across pages, the standard feed filters, embed parsing and
//! link resolution for the composer.

pub mod atproto;
pub mod config;
pub mod feed;
pub mod link;
pub mod runtime;
pub mod state;

pub use atproto::{ClientError, Embed, FeedClient, FeedViewPost, parse_embed};
pub use feed::{FeedDescriptor, FeedSlice, FeedTuner, TuneOptions, TunerFn, tuners_for};
pub use link::{LinkApi, ResolveError, ResolvedLink, resolve_link};
pub use state::FeedSettings;
