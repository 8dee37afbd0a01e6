use gpui::*;
use gpui_component::{ActiveTheme, v_flex};
use gpui_tokio_bridge::Tokio;

use astra_client::{Channel, ChannelEvent};

use crate::chat::events::Submit;
use crate::chat::message::ChatMessage;
use crate::chat::{ChannelHeader, MessageInput, MessageList};
use crate::session::SessionBundle;

/// Window sections in render order; each appears exactly once.
pub(crate) const WINDOW_SECTIONS: [&str; 3] = ["channel-header", "message-list", "message-input"];

/// Channel-scoped view: owns the bound channel handle and exactly one
/// header, message list, and message input.
///
/// The watch subscription starts at construction; events flow from the
/// client worker into the entities without any local buffering or retry.
pub struct ChannelView {
    channel: Channel,
    user_id: String,
    header: Entity<ChannelHeader>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    watch_worker_task: Option<Task<Result<(), gpui_tokio_bridge::JoinError>>>,
    event_reader_task: Option<Task<()>>,
}

impl ChannelView {
    pub fn new(bundle: &SessionBundle, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let header = cx.new(|_| {
            ChannelHeader::new(
                bundle.client.clone(),
                bundle.channel.metadata(),
                bundle.channel.id(),
            )
        });
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(true, window, cx));

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.handle_submit(event.clone(), cx);
        })
        .detach();

        let mut this = Self {
            channel: bundle.channel.clone(),
            user_id: bundle.user_id.clone(),
            header,
            message_list,
            message_input,
            watch_worker_task: None,
            event_reader_task: None,
        };

        this.start_watch(cx);
        this
    }

    pub fn header(&self) -> &Entity<ChannelHeader> {
        &self.header
    }

    fn start_watch(&mut self, cx: &mut Context<Self>) {
        let handle = self.channel.watch();
        let mut stream = handle.stream;

        self.watch_worker_task = Some(Tokio::spawn(cx, handle.worker));
        self.event_reader_task = Some(cx.spawn(async move |this, cx| {
            while let Some(event) = stream.recv().await {
                let _ = this.update(cx, |this, cx| {
                    this.handle_channel_event(event, cx);
                });
            }

            let _ = this.update(cx, |this, cx| {
                this.handle_watch_closed(cx);
            });
        }));
    }

    fn handle_submit(&mut self, event: Submit, cx: &mut Context<Self>) {
        let send = self.channel.send_message(event.text);

        // Fire and forget; delivery confirmation arrives as a message.new event.
        Tokio::spawn(cx, async move {
            if let Err(error) = send.await {
                tracing::warn!(error = %error, "failed to send message");
            }
        })
        .detach();
    }

    fn handle_channel_event(&mut self, event: ChannelEvent, cx: &mut Context<Self>) {
        // Any feed activity can move connection state; the header reads it
        // lazily, so it must be marked dirty itself, not via the parent.
        self.refresh_header(cx);

        match event {
            ChannelEvent::MessageNew { message } => {
                let message = ChatMessage::from_event(message, &self.user_id);
                self.message_list.update(cx, |list, cx| {
                    list.push_message(message, cx);
                });
            }
            ChannelEvent::TypingStart { user } => {
                if user.id != self.user_id {
                    self.message_list.update(cx, |list, cx| {
                        list.typing_started(user.id, cx);
                    });
                }
            }
            ChannelEvent::TypingStop { user } => {
                self.message_list.update(cx, |list, cx| {
                    list.typing_stopped(&user.id, cx);
                });
            }
            ChannelEvent::HealthCheck | ChannelEvent::Unknown => {}
        }
    }

    fn refresh_header(&mut self, cx: &mut Context<Self>) {
        self.header.update(cx, |_, cx| cx.notify());
    }

    fn handle_watch_closed(&mut self, cx: &mut Context<Self>) {
        tracing::debug!(cid = %self.channel.cid(), "channel event feed ended");
        self.watch_worker_task = None;
        self.event_reader_task = None;
        self.refresh_header(cx);
        cx.notify();
    }

    fn render_section(&self, id: &'static str, cx: &Context<Self>) -> AnyElement {
        match id {
            "channel-header" => div()
                .id(id)
                .w_full()
                .flex_shrink_0()
                .child(self.header.clone())
                .into_any_element(),
            "message-list" => div()
                .id(id)
                .flex_1()
                .min_h_0()
                .child(self.message_list.clone())
                .into_any_element(),
            _ => div()
                .id(id)
                .w_full()
                .flex_shrink_0()
                .border_t_1()
                .border_color(cx.theme().border)
                .child(self.message_input.clone())
                .into_any_element(),
        }
    }
}

impl Render for ChannelView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let background = cx.theme().background;
        let sections = WINDOW_SECTIONS.map(|id| self.render_section(id, cx));

        v_flex()
            .id("channel-view")
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(background)
            .children(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::WINDOW_SECTIONS;

    #[test]
    fn window_composes_header_list_and_input_once_each_in_order() {
        // Render iterates this array verbatim, so the composed tree holds
        // exactly these sections in this order.
        assert_eq!(
            WINDOW_SECTIONS,
            ["channel-header", "message-list", "message-input"]
        );

        let mut unique = WINDOW_SECTIONS.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), WINDOW_SECTIONS.len());
    }
}
