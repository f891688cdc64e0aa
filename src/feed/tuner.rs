// SPDX-License-Identifier: MPL-2.0

//! Session-scoped feed tuning: builds slices, runs the filter chain, then
//! drops or trims whatever this session has already shown.

use std::collections::HashSet;

use crate::atproto::FeedViewPost;
use crate::feed::filters::TunerFn;
use crate::feed::slice::FeedSlice;
use tracing::debug;

/// What a session has already shown. Only ever grows until [`FeedTuner::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenState {
    pub keys: HashSet<String>,
    pub uris: HashSet<String>,
    pub root_uris: HashSet<String>,
}

impl SeenState {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.uris.is_empty() && self.root_uris.is_empty()
    }

    fn extend(&mut self, other: SeenState) {
        self.keys.extend(other.keys);
        self.uris.extend(other.uris);
        self.root_uris.extend(other.root_uris);
    }
}

/// Seen state for one `tune` call: reads fall through to the committed
/// state, writes land in a staging set that is committed or discarded as a
/// whole once the page is done.
#[derive(Debug)]
pub struct PendingSeen<'a> {
    committed: &'a SeenState,
    staged: SeenState,
}

impl<'a> PendingSeen<'a> {
    pub fn new(committed: &'a SeenState) -> Self {
        Self {
            committed,
            staged: SeenState::default(),
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.committed.keys.contains(key) || self.staged.keys.contains(key)
    }

    pub fn has_uri(&self, uri: &str) -> bool {
        self.committed.uris.contains(uri) || self.staged.uris.contains(uri)
    }

    pub fn has_root_uri(&self, uri: &str) -> bool {
        self.committed.root_uris.contains(uri) || self.staged.root_uris.contains(uri)
    }

    pub fn mark_key(&mut self, key: &str) {
        if !self.has_key(key) {
            self.staged.keys.insert(key.to_string());
        }
    }

    pub fn mark_uri(&mut self, uri: &str) {
        if !self.has_uri(uri) {
            self.staged.uris.insert(uri.to_string());
        }
    }

    pub fn mark_root_uri(&mut self, uri: &str) {
        if !self.has_root_uri(uri) {
            self.staged.root_uris.insert(uri.to_string());
        }
    }

    /// Everything marked during this call that was not already committed.
    pub fn into_staged(self) -> SeenState {
        self.staged
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TuneOptions {
    /// Produce the same output but leave the session state untouched.
    /// Duplicates within the page are still dropped, so the output equals
    /// what a committed run would return.
    pub dry_run: bool,
}

impl TuneOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Tunes successive pages of one feed. Keep one per feed per session.
#[derive(Debug, Clone, Default)]
pub struct FeedTuner {
    tuners: Vec<TunerFn>,
    seen: SeenState,
}

impl FeedTuner {
    pub fn new(tuners: Vec<TunerFn>) -> Self {
        Self {
            tuners,
            seen: SeenState::default(),
        }
    }

    pub fn tuners(&self) -> &[TunerFn] {
        &self.tuners
    }

    pub fn seen(&self) -> &SeenState {
        &self.seen
    }

    /// Forget everything shown so far, e.g. on pull-to-refresh.
    pub fn reset(&mut self) {
        self.seen = SeenState::default();
    }

    /// Tune one page. Unless `dry_run` is set, everything the returned
    /// slices show is recorded so later pages skip it.
    pub fn tune(&mut self, feed: Vec<FeedViewPost>, options: TuneOptions) -> Vec<FeedSlice> {
        let (slices, staged) = self.run(feed);
        if !options.dry_run {
            self.seen.extend(staged);
        }
        slices
    }

    /// Same as a dry-run `tune`, without needing `&mut`.
    pub fn preview(&self, feed: Vec<FeedViewPost>) -> Vec<FeedSlice> {
        self.run(feed).0
    }

    fn run(&self, feed: Vec<FeedViewPost>) -> (Vec<FeedSlice>, SeenState) {
        let raw_count = feed.len();
        let mut seen = PendingSeen::new(&self.seen);

        let mut slices: Vec<FeedSlice> = feed
            .into_iter()
            .map(FeedSlice::new)
            .filter(|slice| !slice.items().is_empty() || slice.is_fallback_marker())
            .collect();
        debug!(raw_count, slices = slices.len(), "built feed slices");

        for tuner in &self.tuners {
            slices = tuner.apply(&mut seen, slices);
            debug!(tuner = tuner.name(), slices = slices.len(), "applied tuner");
        }

        let slices = dedup_seen(&mut seen, slices);
        debug!(slices = slices.len(), "removed already seen posts");

        (slices, seen.into_staged())
    }
}

/// Drop slices already shown, trim seen ancestors off the front of the rest,
/// and mark what remains.
fn dedup_seen(seen: &mut PendingSeen<'_>, mut slices: Vec<FeedSlice>) -> Vec<FeedSlice> {
    slices.retain_mut(|slice| {
        if seen.has_key(slice.key()) {
            return false;
        }

        // Fallback markers carry no items and are kept as-is.
        if !slice.items().is_empty() {
            let seen_prefix = slice
                .items()
                .iter()
                .take_while(|item| seen.has_uri(&item.post.uri))
                .count();
            slice.trim_front(seen_prefix);

            let Some(leaf) = slice.leaf() else {
                return false;
            };
            let leaf_seen = seen.has_uri(&leaf.post.uri);

            // A reposted reply is shown without its thread, so it must not
            // hide that thread when it turns up later.
            if !(slice.is_reply() && slice.is_repost()) {
                let unseen: Vec<String> = slice
                    .items()
                    .iter()
                    .filter(|item| !seen.has_uri(&item.post.uri))
                    .map(|item| item.post.uri.clone())
                    .collect();
                for uri in &unseen {
                    seen.mark_uri(uri);
                }
            }

            if leaf_seen {
                return false;
            }
        }

        seen.mark_key(slice.key());
        true
    });
    slices
}
