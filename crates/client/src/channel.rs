use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use serde_json::{Map, Value};
use snafu::ResultExt;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::client::{BoxFuture, ClientInner, ClientWorker, expect_success};
use crate::error::{ClientResult, HttpSnafu, SocketSnafu};
use crate::events::{ChannelEvent, ConnectionState};

/// Metadata attached to a channel at creation time.
///
/// `name` and `image` are first-class backend fields; everything else rides
/// along as custom data the backend stores verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChannelMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl ChannelMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }
}

/// Live event feed for one watched channel.
///
/// Dropping the stream cancels the attached worker.
pub struct ChannelEventStream {
    cid: String,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl ChannelEventStream {
    fn new(
        cid: String,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
        cancel_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            cid,
            events,
            cancel_tx: Some(cancel_tx),
        }
    }

    pub fn cid(&self) -> &str {
        &self.cid
    }

    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChannelEvent> {
        self.events.try_recv().ok()
    }

    pub fn cancel(&mut self) -> bool {
        self.cancel_tx
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }
}

impl Drop for ChannelEventStream {
    fn drop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

/// Returned by `Channel::watch`; the caller spawns the worker and reads the stream.
pub struct WatchHandle {
    pub stream: ChannelEventStream,
    pub worker: ClientWorker,
}

/// Handle to one typed, named conversation on the backend.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ClientInner>,
    channel_type: String,
    id: String,
    metadata: ChannelMetadata,
}

impl Channel {
    pub(crate) fn new(
        inner: Arc<ClientInner>,
        channel_type: String,
        id: String,
        metadata: ChannelMetadata,
    ) -> Self {
        Self {
            inner,
            channel_type,
            id,
            metadata,
        }
    }

    pub fn channel_type(&self) -> &str {
        &self.channel_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Composite channel identifier in `type:id` wire form.
    pub fn cid(&self) -> String {
        format!("{}:{}", self.channel_type, self.id)
    }

    pub fn metadata(&self) -> &ChannelMetadata {
        &self.metadata
    }

    /// Materializes the channel on the backend and subscribes to its live
    /// event feed.
    ///
    /// The worker performs the get-or-create call and then pumps socket
    /// frames into the stream until cancelled; failures flip the shared
    /// connection state and end the worker without a local retry.
    pub fn watch(&self) -> WatchHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let stream = ChannelEventStream::new(self.cid(), event_rx, cancel_tx);
        let worker: ClientWorker = Box::pin(run_watch_worker(
            self.inner.clone(),
            self.channel_type.clone(),
            self.id.clone(),
            self.metadata.clone(),
            event_tx,
            cancel_rx,
        ));

        WatchHandle { stream, worker }
    }

    /// Posts one message to the channel.
    pub fn send_message(&self, text: impl Into<String>) -> BoxFuture<ClientResult<()>> {
        let inner = self.inner.clone();
        let channel_type = self.channel_type.clone();
        let id = self.id.clone();
        let text = text.into();

        Box::pin(async move {
            let user = inner.session_user("send-message")?;
            let url = format!("{}/channels/{channel_type}/{id}/message", inner.base_url());
            let payload = serde_json::json!({ "message": { "text": text } });

            let response = inner
                .http
                .post(url)
                .query(&[("api_key", inner.api_key.as_str())])
                .bearer_auth(&user.token)
                .json(&payload)
                .send()
                .await
                .context(HttpSnafu {
                    stage: "send-message",
                })?;

            expect_success("send-message", response).await.map(|_| ())
        })
    }
}

async fn run_watch_worker(
    inner: Arc<ClientInner>,
    channel_type: String,
    id: String,
    metadata: ChannelMetadata,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let cid = format!("{channel_type}:{id}");

    let socket_url = match prepare_watch(&inner, &channel_type, &id, &metadata).await {
        Ok(url) => url,
        Err(error) => {
            tracing::error!(cid = %cid, error = %error, "failed to start channel watch");
            inner.set_connection(ConnectionState::Failed(error.to_string()));
            return;
        }
    };

    let socket = match connect_async(socket_url.as_str()).await.context(SocketSnafu {
        stage: "watch-connect",
    }) {
        Ok((socket, _response)) => socket,
        Err(error) => {
            tracing::error!(cid = %cid, error = %error, "channel event socket failed to open");
            inner.set_connection(ConnectionState::Failed(error.to_string()));
            return;
        }
    };

    tracing::debug!(cid = %cid, "channel watch started");
    let (_write, mut read) = socket.split();

    loop {
        tokio::select! {
            _ = &mut cancel_rx => {
                tracing::debug!(cid = %cid, "channel watch cancelled");
                break;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ChannelEvent>(&text) {
                            Ok(event) => {
                                if event_tx.send(event).is_err() {
                                    return;
                                }
                            }
                            Err(error) => {
                                tracing::debug!(cid = %cid, error = %error, "skipping undecodable event frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(cid = %cid, "channel event socket closed by backend");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        tracing::warn!(cid = %cid, error = %error, "channel event socket failed");
                        inner.set_connection(ConnectionState::Failed(error.to_string()));
                        break;
                    }
                }
            }
        }
    }
}

/// Get-or-create the channel, then derive the event socket URL.
async fn prepare_watch(
    inner: &ClientInner,
    channel_type: &str,
    id: &str,
    metadata: &ChannelMetadata,
) -> ClientResult<String> {
    let user = inner.session_user("watch")?;
    let url = format!("{}/channels/{channel_type}/{id}/query", inner.base_url());
    let payload = serde_json::json!({ "data": metadata, "watch": true });

    let response = inner
        .http
        .post(url)
        .query(&[("api_key", inner.api_key.as_str())])
        .bearer_auth(&user.token)
        .json(&payload)
        .send()
        .await
        .context(HttpSnafu {
            stage: "get-or-create-channel",
        })?;
    expect_success("get-or-create-channel", response).await?;

    Ok(watch_socket_url(
        &inner.base_url(),
        channel_type,
        id,
        &inner.api_key,
        &user.token,
    ))
}

fn watch_socket_url(
    base_url: &str,
    channel_type: &str,
    id: &str,
    api_key: &str,
    token: &str,
) -> String {
    let socket_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };

    format!("{socket_base}/connect/{channel_type}/{id}?api_key={api_key}&token={token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_serializes_custom_fields_inline() {
        let metadata = ChannelMetadata::new()
            .with_name("Hello")
            .with_subtitle("Chat with us about NASA stuff!")
            .with_custom("example", 1);

        assert_eq!(
            serde_json::to_value(&metadata).expect("metadata must serialize"),
            json!({
                "name": "Hello",
                "subtitle": "Chat with us about NASA stuff!",
                "example": 1,
            })
        );
    }

    #[test]
    fn watch_socket_url_downgrades_http_schemes_to_websocket() {
        let url = watch_socket_url("https://chat.internal", "messaging", "demo", "key", "tok");
        assert_eq!(
            url,
            "wss://chat.internal/connect/messaging/demo?api_key=key&token=tok"
        );

        let url = watch_socket_url("http://localhost:3030", "messaging", "demo", "key", "tok");
        assert_eq!(
            url,
            "ws://localhost:3030/connect/messaging/demo?api_key=key&token=tok"
        );
    }
}
