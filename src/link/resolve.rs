// SPDX-License-Identifier: MPL-2.0

//! Turning a pasted link into an embeddable record or an external link card.

use thiserror::Error;
use tracing::{debug, warn};

use crate::atproto::{
    ClientError, GeneratorView, ListView, PostView, StarterPackViewBasic, StrongRef,
};
use crate::link::meta::LinkMeta;
use crate::link::thumb::Thumbnail;
use crate::link::urls::{LinkTarget, RecordKind, classify, is_short_link, make_record_uri};

/// Network calls the resolver depends on.
#[allow(async_fn_in_trait)]
pub trait LinkApi {
    /// Expand a short link to the URL it redirects to.
    async fn resolve_short_link(&self, url: &str) -> Result<String, ClientError>;
    async fn resolve_handle(&self, handle: &str) -> Result<String, ClientError>;
    async fn get_post(&self, uri: &str) -> Result<PostView, ClientError>;
    async fn get_feed_generator(&self, uri: &str) -> Result<GeneratorView, ClientError>;
    async fn get_list(&self, uri: &str) -> Result<ListView, ClientError>;
    async fn get_starter_pack(&self, uri: &str) -> Result<StarterPackViewBasic, ClientError>;
    async fn fetch_link_meta(&self, url: &str) -> Result<LinkMeta, ClientError>;
    async fn fetch_thumbnail(&self, url: &str) -> Result<Thumbnail, ClientError>;
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("The author of this post has disabled embedding")]
    EmbeddingDisabled,

    #[error("Invalid link: {0}")]
    InvalidUri(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone)]
pub enum RecordLinkView {
    Post(Box<PostView>),
    Feed(Box<GeneratorView>),
    List(Box<ListView>),
    StarterPack(Box<StarterPackViewBasic>),
}

impl RecordLinkView {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordLinkView::Post(_) => "post",
            RecordLinkView::Feed(_) => "feed",
            RecordLinkView::List(_) => "list",
            RecordLinkView::StarterPack(_) => "starter-pack",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResolvedLink {
    Record {
        record: StrongRef,
        view: RecordLinkView,
    },
    External {
        uri: String,
        title: String,
        description: String,
        thumb: Option<Thumbnail>,
    },
}

impl ResolvedLink {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedLink::Record { view, .. } => view.kind(),
            ResolvedLink::External { .. } => "external",
        }
    }
}

/// Resolve a URL or `at://` URI pasted into the composer.
pub async fn resolve_link<A: LinkApi>(api: &A, uri: &str) -> Result<ResolvedLink, ResolveError> {
    let mut uri = uri.trim().to_string();
    if uri.is_empty() {
        return Err(ResolveError::InvalidUri(uri));
    }
    if is_short_link(&uri) {
        match api.resolve_short_link(&uri).await {
            Ok(expanded) => {
                debug!(from = %uri, to = %expanded, "expanded short link");
                uri = expanded;
            }
            Err(e) => warn!(%uri, error = %e, "keeping unexpanded short link"),
        }
    }

    match classify(&uri) {
        Some(LinkTarget::Record { kind, actor, rkey }) => {
            debug!(?kind, %actor, %rkey, "resolving record link");
            resolve_record(api, kind, &actor, &rkey).await
        }
        Some(LinkTarget::External(url)) => resolve_external(api, url.as_str()).await,
        None => Err(ResolveError::InvalidUri(uri)),
    }
}

async fn resolve_record<A: LinkApi>(
    api: &A,
    kind: RecordKind,
    actor: &str,
    rkey: &str,
) -> Result<ResolvedLink, ResolveError> {
    let (record, view) = match kind {
        // Post lookups accept handle-based URIs, so only the others need a DID.
        RecordKind::Post => {
            let uri = make_record_uri(actor, kind.collection(), rkey);
            let post = api.get_post(&uri).await?;
            if post.is_embedding_disabled() {
                return Err(ResolveError::EmbeddingDisabled);
            }
            (strong_ref(&post.uri, &post.cid), RecordLinkView::Post(Box::new(post)))
        }
        RecordKind::Feed => {
            let uri = did_record_uri(api, kind, actor, rkey).await?;
            let view = api.get_feed_generator(&uri).await?;
            (strong_ref(&view.uri, &view.cid), RecordLinkView::Feed(Box::new(view)))
        }
        RecordKind::List => {
            let uri = did_record_uri(api, kind, actor, rkey).await?;
            let view = api.get_list(&uri).await?;
            (strong_ref(&view.uri, &view.cid), RecordLinkView::List(Box::new(view)))
        }
        RecordKind::StarterPack => {
            let uri = did_record_uri(api, kind, actor, rkey).await?;
            let view = api.get_starter_pack(&uri).await?;
            (
                strong_ref(&view.uri, &view.cid),
                RecordLinkView::StarterPack(Box::new(view)),
            )
        }
    };
    Ok(ResolvedLink::Record { record, view })
}

async fn did_record_uri<A: LinkApi>(
    api: &A,
    kind: RecordKind,
    actor: &str,
    rkey: &str,
) -> Result<String, ClientError> {
    let did = resolve_did(api, actor).await?;
    Ok(make_record_uri(&did, kind.collection(), rkey))
}

async fn resolve_did<A: LinkApi>(api: &A, actor: &str) -> Result<String, ClientError> {
    if actor.starts_with("did:") {
        return Ok(actor.to_string());
    }
    api.resolve_handle(actor).await
}

fn strong_ref(uri: &str, cid: &str) -> StrongRef {
    StrongRef {
        uri: uri.to_string(),
        cid: cid.to_string(),
    }
}

/// Build a link card from the page's Open Graph metadata. A thumbnail that
/// cannot be fetched or decoded leaves the card without one.
pub async fn resolve_external<A: LinkApi>(
    api: &A,
    url: &str,
) -> Result<ResolvedLink, ResolveError> {
    let meta = api.fetch_link_meta(url).await?;

    let thumb = match meta.image.as_deref() {
        Some(image) => match api.fetch_thumbnail(image).await {
            Ok(thumb) => Some(thumb),
            Err(e) => {
                warn!(%image, error = %e, "dropping link card thumbnail");
                None
            }
        },
        None => None,
    };

    Ok(ResolvedLink::External {
        uri: url.to_string(),
        title: meta.title.unwrap_or_default(),
        description: meta.description.unwrap_or_default(),
        thumb,
    })
}
