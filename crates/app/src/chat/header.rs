use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex};

use astra_client::{ChannelMetadata, ChatClient, ConnectionState};

/// Header bar for the bound channel: avatar, display name, subtitle, and a
/// connection dot driven by the client's session state.
pub struct ChannelHeader {
    client: ChatClient,
    display_name: SharedString,
    subtitle: SharedString,
}

impl ChannelHeader {
    pub fn new(client: ChatClient, metadata: &ChannelMetadata, fallback_name: &str) -> Self {
        let display_name = metadata
            .name
            .clone()
            .unwrap_or_else(|| fallback_name.to_string());
        let subtitle = metadata.subtitle.clone().unwrap_or_default();

        Self {
            client,
            display_name: SharedString::from(display_name),
            subtitle: SharedString::from(subtitle),
        }
    }

    /// Current session state as drawn by the connection dot; re-read on every
    /// render so worker-side transitions show up once the entity is notified.
    fn connection_state(&self) -> ConnectionState {
        self.client.connection_state()
    }

    fn avatar_initial(&self) -> String {
        self.display_name
            .chars()
            .next()
            .map(|letter| letter.to_uppercase().to_string())
            .unwrap_or_else(|| "#".to_string())
    }
}

impl Render for ChannelHeader {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let dot_color = match self.connection_state() {
            ConnectionState::Connected => theme.primary,
            ConnectionState::Failed(_) => theme.danger,
            ConnectionState::Idle | ConnectionState::Connecting => theme.muted_foreground,
        };

        h_flex()
            .id("channel-header-bar")
            .w_full()
            .items_center()
            .gap_3()
            .px_4()
            .py_3()
            .bg(theme.background)
            .border_b_1()
            .border_color(theme.border)
            .child(
                div()
                    .size(px(36.))
                    .flex_shrink_0()
                    .rounded_full()
                    .bg(theme.muted)
                    .border_1()
                    .border_color(theme.border)
                    .flex()
                    .items_center()
                    .justify_center()
                    .child(
                        Label::new(self.avatar_initial())
                            .text_sm()
                            .text_color(theme.foreground),
                    ),
            )
            .child(
                v_flex()
                    .min_w_0()
                    .child(
                        Label::new(self.display_name.clone())
                            .text_sm()
                            .font_weight(FontWeight::SEMIBOLD)
                            .text_color(theme.foreground),
                    )
                    .child(
                        Label::new(self.subtitle.clone())
                            .text_xs()
                            .text_color(theme.muted_foreground),
                    ),
            )
            .child(div().flex_1().min_w_0())
            .child(div().size(px(8.)).rounded_full().bg(dot_color))
    }
}

#[cfg(test)]
mod tests {
    use astra_client::{ChannelMetadata, ChatClient, ConnectionState};

    use super::ChannelHeader;

    #[test]
    fn header_reads_connection_state_from_the_shared_client() {
        let client = ChatClient::new("key-abc").expect("client must build");
        let header = ChannelHeader::new(
            client.clone(),
            &ChannelMetadata::new().with_name("Hello"),
            "demo",
        );

        assert_eq!(header.connection_state(), ConnectionState::Idle);

        // The dot tracks state flipped elsewhere on the shared client; no
        // header-local copy may go stale.
        let _handle = client.connect_user("alice", "tok123");
        assert_eq!(header.connection_state(), ConnectionState::Connecting);
    }
}
