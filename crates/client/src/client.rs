use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;
use snafu::{ResultExt, ensure};

use crate::channel::{Channel, ChannelMetadata};
use crate::error::{
    BackendStatusSnafu, ClientResult, DecodePayloadSnafu, EmptyApiKeySnafu, HttpSnafu,
    InvalidBaseUrlSnafu, NotConnectedSnafu,
};
use crate::events::ConnectionState;
use crate::query::{ChannelFilter, ChannelRef, ChannelSort, QueryOptions};

/// Hosted backend endpoint used when the caller never overrides it.
pub const DEFAULT_BASE_URL: &str = "https://chat.astra-api.dev";

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
/// Detached background operation; completion is observed through state, not a return value.
pub type ClientWorker = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// The user this client authenticates as, with its opaque bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub token: String,
}

#[derive(Debug)]
pub(crate) struct ClientInner {
    pub(crate) api_key: String,
    pub(crate) base_url: ArcSwap<String>,
    pub(crate) connection: ArcSwap<ConnectionState>,
    pub(crate) session: ArcSwap<Option<UserRef>>,
    pub(crate) http: reqwest::Client,
}

impl ClientInner {
    pub(crate) fn base_url(&self) -> String {
        self.base_url.load().as_ref().clone()
    }

    pub(crate) fn session_user(&self, stage: &'static str) -> ClientResult<UserRef> {
        self.session
            .load()
            .as_ref()
            .clone()
            .map(Ok)
            .unwrap_or_else(|| NotConnectedSnafu { stage }.fail())
    }

    pub(crate) fn set_connection(&self, state: ConnectionState) {
        self.connection.store(Arc::new(state));
    }
}

/// Returned by `connect_user`; the caller spawns the worker and moves on.
pub struct ConnectHandle {
    pub worker: ClientWorker,
}

/// Client bound to one backend application key.
///
/// Cheap to clone; all clones share the same session and connection state.
#[derive(Debug, Clone)]
pub struct ChatClient {
    inner: Arc<ClientInner>,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>) -> ClientResult<Self> {
        let api_key = api_key.into().trim().to_string();
        ensure!(!api_key.is_empty(), EmptyApiKeySnafu { stage: "new" });

        Ok(Self {
            inner: Arc::new(ClientInner {
                api_key,
                base_url: ArcSwap::from_pointee(DEFAULT_BASE_URL.to_string()),
                connection: ArcSwap::from_pointee(ConnectionState::Idle),
                session: ArcSwap::from_pointee(None),
                http: reqwest::Client::new(),
            }),
        })
    }

    /// Points the client at a different backend deployment.
    ///
    /// Only meaningful before any remote operation is fired.
    pub fn set_base_url(&self, url: impl Into<String>) -> ClientResult<()> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        ensure!(
            url.starts_with("http://") || url.starts_with("https://"),
            InvalidBaseUrlSnafu {
                stage: "set-base-url",
                url,
            }
        );

        self.inner.base_url.store(Arc::new(url));
        Ok(())
    }

    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    pub fn base_url(&self) -> String {
        self.inner.base_url()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.load().as_ref().clone()
    }

    pub fn current_user(&self) -> Option<UserRef> {
        self.inner.session.load().as_ref().clone()
    }

    /// Begins an authenticated session as the given user.
    ///
    /// The session is recorded immediately so channel operations can attach
    /// the token; the remote handshake runs inside the returned worker and
    /// reports only through `connection_state`.
    pub fn connect_user(&self, id: impl Into<String>, token: impl Into<String>) -> ConnectHandle {
        let user = UserRef {
            id: id.into(),
            token: token.into(),
        };

        self.inner.session.store(Arc::new(Some(user.clone())));
        self.inner.set_connection(ConnectionState::Connecting);

        let inner = self.inner.clone();
        ConnectHandle {
            worker: Box::pin(Self::run_connect_worker(inner, user)),
        }
    }

    /// Builds a local handle for one typed, named channel.
    ///
    /// The backend side is materialized by `Channel::watch`.
    pub fn channel(
        &self,
        channel_type: impl Into<String>,
        id: impl Into<String>,
        metadata: ChannelMetadata,
    ) -> Channel {
        Channel::new(self.inner.clone(), channel_type.into(), id.into(), metadata)
    }

    /// Queries the channel list matching `filter`, ordered by `sort`.
    pub fn query_channels(
        &self,
        filter: ChannelFilter,
        sort: ChannelSort,
        options: QueryOptions,
    ) -> BoxFuture<ClientResult<Vec<ChannelRef>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let user = inner.session_user("query-channels")?;
            let url = format!("{}/channels", inner.base_url());
            let payload = serde_json::json!({
                "filter_conditions": filter,
                "sort": sort,
                "subscribe": options.subscribe,
            });

            let response = inner
                .http
                .post(url)
                .query(&[("api_key", inner.api_key.as_str())])
                .bearer_auth(&user.token)
                .json(&payload)
                .send()
                .await
                .context(HttpSnafu {
                    stage: "query-channels",
                })?;
            let response = expect_success("query-channels", response).await?;

            let body = response.text().await.context(HttpSnafu {
                stage: "read-channel-list",
            })?;
            let decoded: ChannelListResponse =
                serde_json::from_str(&body).context(DecodePayloadSnafu {
                    stage: "decode-channel-list",
                })?;

            tracing::debug!(
                channel_count = decoded.channels.len(),
                "channel list query completed"
            );
            Ok(decoded.channels)
        })
    }

    async fn run_connect_worker(inner: Arc<ClientInner>, user: UserRef) {
        match Self::authenticate(&inner, &user).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "chat session established");
                inner.set_connection(ConnectionState::Connected);
            }
            Err(error) => {
                tracing::error!(user_id = %user.id, error = %error, "chat session failed");
                inner.set_connection(ConnectionState::Failed(error.to_string()));
            }
        }
    }

    async fn authenticate(inner: &ClientInner, user: &UserRef) -> ClientResult<()> {
        let url = format!("{}/connect", inner.base_url());
        let payload = serde_json::json!({ "user": { "id": user.id } });

        let response = inner
            .http
            .post(url)
            .query(&[("api_key", inner.api_key.as_str())])
            .bearer_auth(&user.token)
            .json(&payload)
            .send()
            .await
            .context(HttpSnafu {
                stage: "connect-user",
            })?;

        expect_success("connect-user", response).await.map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    channels: Vec<ChannelRef>,
}

pub(crate) async fn expect_success(
    stage: &'static str,
    response: reqwest::Response,
) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    BackendStatusSnafu {
        stage,
        status: status.as_u16(),
        body,
    }
    .fail()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn construction_rejects_empty_api_key() {
        let error = ChatClient::new("   ").expect_err("blank key must be rejected");
        assert!(matches!(error, ClientError::EmptyApiKey { .. }));
    }

    #[test]
    fn base_url_override_requires_http_scheme() {
        let client = ChatClient::new("key-abc").expect("client must build");

        let error = client
            .set_base_url("chat.internal:9000")
            .expect_err("scheme-less URL must be rejected");
        assert!(matches!(error, ClientError::InvalidBaseUrl { .. }));

        client
            .set_base_url("https://chat.internal:9000/")
            .expect("https URL must be accepted");
        assert_eq!(client.base_url(), "https://chat.internal:9000");
    }

    #[test]
    fn connect_user_records_session_before_handshake_completes() {
        let client = ChatClient::new("key-abc").expect("client must build");
        let handle = client.connect_user("alice", "tok123");
        drop(handle);

        assert_eq!(
            client.current_user(),
            Some(UserRef {
                id: "alice".to_string(),
                token: "tok123".to_string(),
            })
        );
        assert_eq!(client.connection_state(), ConnectionState::Connecting);
    }
}
