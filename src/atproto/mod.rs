// SPDX-License-Identifier: MPL-2.0

mod client;
pub mod embed;
pub mod record;
mod types;

pub use client::{ClientError, FeedClient};
pub use embed::{Embed, parse_embed, parse_embed_record_view};
pub use record::{PostRecord, PostReplyRef, RecordError, StrongRef};
pub use types::{
    ActorViewerState, AspectRatio, BlockedAuthor, BlockedPost, EmbedView, ExternalView, FeedPage,
    FeedReason, FeedViewPost, GeneratorView, ImagesView, LabelerView, ListView, NotFoundPost,
    PostView, PostViewerState, ProfileViewBasic, ReasonFeedSource, ReasonRepost, RecordView,
    RecordViewRecord, RecordWithMediaView, ReplyNode, ReplyRef, Session, StarterPackViewBasic,
    VideoView, ViewBlocked, ViewDetached, ViewExternal, ViewImage, ViewNotFound, ViewRecord,
};
