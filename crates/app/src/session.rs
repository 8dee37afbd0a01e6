use snafu::{ResultExt, Snafu};

use astra_client::{
    BoxFuture, Channel, ChannelFilter, ChannelMetadata, ChannelRef, ChannelSort, ChatClient,
    ClientError, ClientResult, ClientWorker, QueryOptions,
};

use crate::config::SessionConfig;

/// Every channel in this demo is a plain messaging conversation.
pub const CHANNEL_TYPE: &str = "messaging";
pub const CHANNEL_DISPLAY_NAME: &str = "Hello";
pub const CHANNEL_SUBTITLE: &str = "Chat with us about NASA stuff!";
pub const CHANNEL_IMAGE_URL: &str = "https://images.unsplash.com/photo-1512138664757-360e0aad5132?ixlib=rb-1.2.1&ixid=eyJhcHBfaWQiOjEyMDd9&auto=format&fit=crop&w=2851&q=80";
/// Custom tag that marks channels belonging to this example deployment.
pub const CHANNEL_EXAMPLE_TAG: i64 = 1;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BootstrapError {
    #[snafu(display("failed to construct chat client: {source}"))]
    CreateClient {
        stage: &'static str,
        source: ClientError,
    },
    #[snafu(display("failed to configure backend endpoint: {source}"))]
    ConfigureEndpoint {
        stage: &'static str,
        source: ClientError,
    },
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Immutable handles produced by `bootstrap` and threaded into the view.
pub struct SessionBundle {
    pub client: ChatClient,
    pub channel: Channel,
    pub user_id: String,
    pub theme: String,
}

/// Background operations `bootstrap` fires; the caller spawns them and never
/// awaits their completion directly.
pub struct SessionWorkers {
    /// Remote authentication handshake; reports through connection state.
    pub connect: ClientWorker,
    /// Channel list query with live subscription. The result is held but not
    /// rendered anywhere in this demo.
    pub channel_list: BoxFuture<ClientResult<Vec<ChannelRef>>>,
}

/// Fixed metadata attached to the demo channel at creation.
pub fn demo_channel_metadata() -> ChannelMetadata {
    ChannelMetadata::new()
        .with_name(CHANNEL_DISPLAY_NAME)
        .with_subtitle(CHANNEL_SUBTITLE)
        .with_image(CHANNEL_IMAGE_URL)
        .with_custom("example", CHANNEL_EXAMPLE_TAG)
}

/// Filter selecting the example deployment's messaging channels.
pub fn demo_channel_filter() -> ChannelFilter {
    ChannelFilter::channel_type(CHANNEL_TYPE).with_custom("example", CHANNEL_EXAMPLE_TAG)
}

/// One-shot session and channel setup, run before first render.
///
/// Establishes the authenticated client, binds the configured channel with
/// its fixed metadata, and issues the channel list query. Nothing here waits
/// on the network; the UI reacts to client state as it changes.
pub fn bootstrap(config: &SessionConfig) -> BootstrapResult<(SessionBundle, SessionWorkers)> {
    let client = ChatClient::new(&config.api_key).context(CreateClientSnafu {
        stage: "bootstrap-create-client",
    })?;
    client
        .set_base_url(&config.server_endpoint)
        .context(ConfigureEndpointSnafu {
            stage: "bootstrap-set-base-url",
        })?;

    let connect = client.connect_user(&config.user, &config.user_token);
    let channel = client.channel(CHANNEL_TYPE, &config.channel, demo_channel_metadata());

    let channel_list = client.query_channels(
        demo_channel_filter(),
        ChannelSort::last_message_at_desc(),
        QueryOptions::subscribed(),
    );

    tracing::info!(
        user_id = %config.user,
        cid = %channel.cid(),
        endpoint = %config.server_endpoint,
        "session bootstrapped"
    );

    let bundle = SessionBundle {
        client,
        channel,
        user_id: config.user.clone(),
        theme: config.theme.clone(),
    };
    let workers = SessionWorkers {
        connect: connect.worker,
        channel_list,
    };

    Ok((bundle, workers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LaunchParams, SessionConfig};
    use serde_json::json;

    #[test]
    fn demo_metadata_carries_the_fixed_fields() {
        let metadata = demo_channel_metadata();

        assert_eq!(metadata.name.as_deref(), Some("Hello"));
        assert_eq!(
            metadata.subtitle.as_deref(),
            Some("Chat with us about NASA stuff!")
        );
        assert_eq!(metadata.image.as_deref(), Some(CHANNEL_IMAGE_URL));
        assert_eq!(metadata.custom.get("example"), Some(&json!(1)));
    }

    #[test]
    fn demo_filter_matches_example_messaging_channels() {
        assert_eq!(
            serde_json::to_value(demo_channel_filter()).expect("filter must serialize"),
            json!({ "type": "messaging", "example": 1 })
        );
    }

    #[test]
    fn bootstrap_binds_alice_to_the_demo_channel() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ASTRA_CHAT_API_KEY", "key-abc");

            let params = LaunchParams::from_args(
                ["user=alice", "user_token=tok123"]
                    .into_iter()
                    .map(String::from),
            );
            let config = SessionConfig::resolve(params).expect("config must resolve");
            let (bundle, _workers) = bootstrap(&config).expect("bootstrap must succeed");

            let user = bundle.client.current_user().expect("session must be set");
            assert_eq!(user.id, "alice");
            assert_eq!(user.token, "tok123");
            assert_eq!(bundle.channel.cid(), "messaging:demo");
            Ok(())
        });
    }
}
