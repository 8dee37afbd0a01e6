use gpui::*;
use gpui_component::{ActiveTheme, Theme, ThemeMode, ThemeRegistry};
use gpui_tokio_bridge::Tokio;

use astra_client::ChatClient;

use crate::chat::ChannelView;
use crate::session::{SessionBundle, SessionWorkers};

gpui::actions!(astra, [Quit]);

/// Applies the configured theme by registry name, falling back to the
/// toolkit's built-in dark theme when the name is unknown.
pub fn apply_theme(theme_name: &str, cx: &mut App) {
    if let Some(theme_config) = ThemeRegistry::global(cx)
        .themes()
        .get(&SharedString::from(theme_name.to_string()))
        .cloned()
    {
        let mode = theme_config.mode;
        let theme = Theme::global_mut(cx);
        if mode.is_dark() {
            theme.dark_theme = theme_config;
        } else {
            theme.light_theme = theme_config;
        }
        Theme::change(mode, None, cx);
        return;
    }

    tracing::debug!(theme = theme_name, "theme not registered, using default dark");
    Theme::change(ThemeMode::Dark, None, cx);
}

/// Root view: carries the authenticated client for the lifetime of the
/// window and hosts the single channel view.
pub struct ChatApp {
    client: ChatClient,
    channel_view: Entity<ChannelView>,
    _connect_task: Task<Result<(), gpui_tokio_bridge::JoinError>>,
    // Held but never rendered; the demo issues the list query without a
    // channel switcher to consume it.
    _channel_list_task: Task<Result<(), gpui_tokio_bridge::JoinError>>,
}

impl ChatApp {
    pub fn new(
        bundle: SessionBundle,
        workers: SessionWorkers,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let connect_task = Tokio::spawn(cx, workers.connect);

        let channel_list = workers.channel_list;
        let channel_list_task = Tokio::spawn(cx, async move {
            match channel_list.await {
                Ok(channels) => {
                    tracing::debug!(channel_count = channels.len(), "channel list query resolved");
                }
                Err(error) => {
                    tracing::warn!(error = %error, "channel list query failed");
                }
            }
        });

        let channel_view = cx.new(|cx| ChannelView::new(&bundle, window, cx));

        Self {
            client: bundle.client,
            channel_view,
            _connect_task: connect_task,
            _channel_list_task: channel_list_task,
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }
}

impl Render for ChatApp {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        div()
            .id("chat-app-root")
            .size_full()
            .bg(theme.background)
            .child(self.channel_view.clone())
    }
}
