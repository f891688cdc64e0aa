// SPDX-License-Identifier: MPL-2.0

pub mod meta;
pub mod resolve;
pub mod thumb;
pub mod urls;

pub use meta::LinkMeta;
pub use resolve::{LinkApi, RecordLinkView, ResolveError, ResolvedLink, resolve_external, resolve_link};
pub use thumb::{ThumbError, Thumbnail, resize_thumbnail};
pub use urls::{LinkTarget, RecordKind, classify, is_short_link, make_record_uri};
