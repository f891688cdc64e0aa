// SPDX-License-Identifier: MPL-2.0

pub mod descriptor;
pub mod filters;
pub mod lang;
pub mod slice;
pub mod tuner;

#[cfg(test)]
mod fixtures;

pub use descriptor::{AuthorFilter, DescriptorError, FeedDescriptor, tuners_for};
pub use filters::TunerFn;
pub use slice::{FeedSlice, FeedSliceItem, SliceAuthors, SliceReason};
pub use tuner::{FeedTuner, PendingSeen, SeenState, TuneOptions};
