// SPDX-License-Identifier: MPL-2.0

use crate::atproto::types::{
    FeedPage, GeneratorView, ListView, PostView, Session, StarterPackViewBasic,
};
use crate::config::{DEFAULT_PDS, LINK_META_TIMEOUT_SECS, PUBLIC_APPVIEW, THUMB_TIMEOUT_SECS, USER_AGENT};
use crate::feed::FeedDescriptor;
use crate::link::{LinkApi, LinkMeta, Thumbnail, resize_thumbnail};
use atrium_api::agent::atp_agent::AtpAgent;
use atrium_api::agent::atp_agent::store::MemorySessionStore;
use atrium_xrpc_client::reqwest::ReqwestClient;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("unsupported feed: {0}")]
    Unsupported(String),
}

type Agent = AtpAgent<MemorySessionStore, ReqwestClient>;

/// Wraps atrium so the rest of the crate only sees our own types.
pub struct FeedClient {
    agent: RwLock<Option<Arc<Agent>>>,
    service_url: String,
}

impl FeedClient {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_PDS)
    }

    pub fn with_service(service_url: &str) -> Self {
        Self {
            agent: RwLock::new(None),
            service_url: service_url.to_string(),
        }
    }

    /// Client for the public AppView. Read-only endpoints work without a session.
    pub fn public() -> Self {
        Self::public_at(PUBLIC_APPVIEW)
    }

    pub fn public_at(service_url: &str) -> Self {
        let client = Self::with_service(service_url);
        client.install_agent(Self::build_agent(service_url));
        client
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    fn build_agent(service_url: &str) -> Agent {
        AtpAgent::new(ReqwestClient::new(service_url), MemorySessionStore::default())
    }

    fn install_agent(&self, agent: Agent) {
        if let Ok(mut guard) = self.agent.write() {
            *guard = Some(Arc::new(agent));
        }
    }

    /// The agent is cloned out so no lock is held across an await.
    fn agent(&self) -> Result<Arc<Agent>, ClientError> {
        self.agent
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or(ClientError::NotAuthenticated)
    }

    pub async fn login(&self, handle: &str, password: &str) -> Result<Session, ClientError> {
        let agent = Self::build_agent(&self.service_url);

        let result = agent
            .login(handle, password)
            .await
            .map_err(|e| ClientError::Auth(e.to_string()))?;

        let session = Session {
            did: result.data.did.to_string(),
            handle: result.data.handle.to_string(),
            access_jwt: result.data.access_jwt.clone(),
            refresh_jwt: result.data.refresh_jwt.clone(),
        };

        self.install_agent(agent);
        Ok(session)
    }

    /// Fetch one page of whatever feed the descriptor names.
    pub async fn get_feed_page(
        &self,
        descriptor: &FeedDescriptor,
        cursor: Option<&str>,
    ) -> Result<FeedPage, ClientError> {
        match descriptor {
            FeedDescriptor::Following => self.get_timeline(cursor).await,
            FeedDescriptor::Author { actor, filter } => {
                self.get_author_feed(actor, Some(filter.as_str()), cursor).await
            }
            FeedDescriptor::FeedGenerator { uri } => self.get_feed(uri, cursor).await,
            FeedDescriptor::List { uri } => self.get_list_feed(uri, cursor).await,
            other => Err(ClientError::Unsupported(other.to_string())),
        }
    }

    pub async fn get_timeline(&self, cursor: Option<&str>) -> Result<FeedPage, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::app::bsky::feed::get_timeline::ParametersData {
            algorithm: None,
            cursor: cursor.map(String::from),
            limit: None,
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_timeline(params.into())
            .await
            .map_err(network)?;

        Ok(FeedPage {
            feed: from_sdk(&output.data.feed)?,
            cursor: output.data.cursor.clone(),
        })
    }

    /// Fetch a custom feed by its AT-URI
    pub async fn get_feed(
        &self,
        feed_uri: &str,
        cursor: Option<&str>,
    ) -> Result<FeedPage, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::app::bsky::feed::get_feed::ParametersData {
            feed: feed_uri
                .parse()
                .map_err(|e| ClientError::InvalidResponse(format!("invalid feed URI: {e}")))?,
            cursor: cursor.map(String::from),
            limit: None,
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_feed(params.into())
            .await
            .map_err(network)?;

        Ok(FeedPage {
            feed: from_sdk(&output.data.feed)?,
            cursor: output.data.cursor.clone(),
        })
    }

    /// Get an author's feed (posts by a specific user)
    pub async fn get_author_feed(
        &self,
        actor: &str,
        filter: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<FeedPage, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::app::bsky::feed::get_author_feed::ParametersData {
            actor: actor
                .parse()
                .map_err(|e| ClientError::InvalidResponse(format!("invalid actor: {e}")))?,
            cursor: cursor.map(String::from),
            filter: filter.map(String::from),
            include_pins: None,
            limit: None,
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_author_feed(params.into())
            .await
            .map_err(network)?;

        Ok(FeedPage {
            feed: from_sdk(&output.data.feed)?,
            cursor: output.data.cursor.clone(),
        })
    }

    pub async fn get_list_feed(
        &self,
        list_uri: &str,
        cursor: Option<&str>,
    ) -> Result<FeedPage, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::app::bsky::feed::get_list_feed::ParametersData {
            cursor: cursor.map(String::from),
            limit: None,
            list: list_uri
                .parse()
                .map_err(|e| ClientError::InvalidResponse(format!("invalid list URI: {e}")))?,
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_list_feed(params.into())
            .await
            .map_err(network)?;

        Ok(FeedPage {
            feed: from_sdk(&output.data.feed)?,
            cursor: output.data.cursor.clone(),
        })
    }

    fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ClientError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkApi for FeedClient {
    /// Short links answer with `{"url": "..."}` when asked for JSON.
    async fn resolve_short_link(&self, url: &str) -> Result<String, ClientError> {
        let client = Self::http_client(LINK_META_TIMEOUT_SECS)?;
        let body = client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        value
            .get("url")
            .and_then(serde_json::Value::as_str)
            .map(String::from)
            .ok_or_else(|| ClientError::InvalidResponse(format!("short link {url} has no target")))
    }

    /// Resolve an AT Protocol handle to a DID.
    async fn resolve_handle(&self, handle: &str) -> Result<String, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::com::atproto::identity::resolve_handle::ParametersData {
            handle: handle
                .parse()
                .map_err(|_| ClientError::InvalidResponse("invalid handle".into()))?,
        };

        let output = agent
            .api
            .com
            .atproto
            .identity
            .resolve_handle(params.into())
            .await
            .map_err(network)?;

        Ok(output.data.did.to_string())
    }

    async fn get_post(&self, uri: &str) -> Result<PostView, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::app::bsky::feed::get_posts::ParametersData {
            uris: vec![
                uri.parse()
                    .map_err(|e| ClientError::InvalidResponse(format!("invalid URI: {e}")))?,
            ],
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_posts(params.into())
            .await
            .map_err(network)?;

        let mut posts: Vec<PostView> = from_sdk(&output.data.posts)?;
        if posts.is_empty() {
            return Err(ClientError::NotFound(uri.to_string()));
        }
        Ok(posts.swap_remove(0))
    }

    async fn get_feed_generator(&self, uri: &str) -> Result<GeneratorView, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::app::bsky::feed::get_feed_generator::ParametersData {
            feed: uri
                .parse()
                .map_err(|e| ClientError::InvalidResponse(format!("invalid feed URI: {e}")))?,
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_feed_generator(params.into())
            .await
            .map_err(network)?;

        from_sdk(&output.data.view)
    }

    async fn get_list(&self, uri: &str) -> Result<ListView, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::app::bsky::graph::get_list::ParametersData {
            cursor: None,
            limit: None,
            list: uri
                .parse()
                .map_err(|e| ClientError::InvalidResponse(format!("invalid list URI: {e}")))?,
        };

        let output = agent
            .api
            .app
            .bsky
            .graph
            .get_list(params.into())
            .await
            .map_err(network)?;

        from_sdk(&output.data.list)
    }

    async fn get_starter_pack(&self, uri: &str) -> Result<StarterPackViewBasic, ClientError> {
        let agent = self.agent()?;

        let params = atrium_api::app::bsky::graph::get_starter_pack::ParametersData {
            starter_pack: uri.parse().map_err(|e| {
                ClientError::InvalidResponse(format!("invalid starter pack URI: {e}"))
            })?,
        };

        let output = agent
            .api
            .app
            .bsky
            .graph
            .get_starter_pack(params.into())
            .await
            .map_err(network)?;

        from_sdk(&output.data.starter_pack)
    }

    async fn fetch_link_meta(&self, url: &str) -> Result<LinkMeta, ClientError> {
        let client = Self::http_client(LINK_META_TIMEOUT_SECS)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(LinkMeta::from_html(&final_url, &html))
    }

    async fn fetch_thumbnail(&self, url: &str) -> Result<Thumbnail, ClientError> {
        let client = Self::http_client(THUMB_TIMEOUT_SECS)?;

        let bytes = client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClientError::Network(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        resize_thumbnail(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

fn network(e: impl std::fmt::Display) -> ClientError {
    debug!(error = %e, "xrpc request failed");
    ClientError::Network(e.to_string())
}

/// Convert SDK output into our wire types through its JSON form.
fn from_sdk<S: Serialize, T: DeserializeOwned>(value: &S) -> Result<T, ClientError> {
    let json =
        serde_json::to_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_is_unauthenticated() {
        let client = FeedClient::new();
        assert_eq!(client.service_url(), DEFAULT_PDS);
        assert!(matches!(client.agent(), Err(ClientError::NotAuthenticated)));
    }

    #[test]
    fn test_public_client_has_agent() {
        let client = FeedClient::public();
        assert_eq!(client.service_url(), PUBLIC_APPVIEW);
        assert!(client.agent().is_ok());
    }

    #[tokio::test]
    async fn test_feed_calls_require_agent() {
        let client = FeedClient::new();
        assert!(matches!(
            client.get_timeline(None).await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(matches!(
            client.get_post("at://did:plc:a/app.bsky.feed.post/1").await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_feed_page_dispatch() {
        let client = FeedClient::new();
        assert!(matches!(
            client.get_feed_page(&FeedDescriptor::Demo, None).await,
            Err(ClientError::Unsupported(d)) if d == "demo"
        ));
        assert!(matches!(
            client.get_feed_page(&FeedDescriptor::Following, None).await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    /// Serve one canned HTTP response on a loopback port.
    fn serve_once(response: &'static str) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/missing")
    }

    #[tokio::test]
    async fn test_link_meta_rejects_error_pages() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\nContent-Length: 24\r\nConnection: close\r\n\r\n<title>Not Found</title>",
        );

        let result = FeedClient::new().fetch_link_meta(&url).await;
        assert!(matches!(result, Err(ClientError::Network(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_link_meta_scrapes_ok_pages() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 20\r\nConnection: close\r\n\r\n<title>Hello</title>",
        );

        let meta = FeedClient::new().fetch_link_meta(&url).await.unwrap();
        assert_eq!(meta.url, url);
        assert_eq!(meta.title.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_from_sdk_round_trips_json() {
        let value = serde_json::json!({ "feed": [], "cursor": "abc" });
        let page: FeedPage = from_sdk(&value).unwrap();
        assert!(page.feed.is_empty());
        assert_eq!(page.cursor.as_deref(), Some("abc"));
    }
}
