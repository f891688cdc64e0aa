// SPDX-License-Identifier: MPL-2.0

pub const APP_ID: &str = "io.github.sethcottle.FeedTuner";
pub const APP_NAME: &str = "FeedTuner";

pub const DEFAULT_PDS: &str = "https://bsky.social";

/// Unauthenticated AppView used when no session is available.
pub const PUBLIC_APPVIEW: &str = "https://public.api.bsky.app";

/// Sentinel post injected by the feed layer when a feed has run out of content.
pub const FALLBACK_MARKER_URI: &str = "at://did:plc:fallback/app.bsky.feed.post/fallback-marker";

pub const SHORT_LINK_HOST: &str = "go.bsky.app";

/// Hosts whose URLs are treated as links into the Bluesky web app.
pub const BSKY_APP_HOSTS: &[&str] = &["bsky.app", "main.bsky.dev", "staging.bsky.app"];

pub const USER_AGENT: &str = "FeedTuner/0.1 (Bluesky feed tools)";

/// Timeout for Open Graph page fetches, in seconds.
pub const LINK_META_TIMEOUT_SECS: u64 = 5;

/// Timeout for thumbnail downloads, in seconds.
pub const THUMB_TIMEOUT_SECS: u64 = 15;

pub const THUMB_MAX_DIMENSION: u32 = 2000;
pub const THUMB_MAX_BYTES: usize = 1_000_000;

/// Env var read by the CLI to configure the tracing filter.
pub const LOG_ENV: &str = "FEEDTUNER_LOG";
