use std::rc::Rc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex, v_virtual_list};

use crate::chat::message::{ChatMessage, TypingState};
use crate::chat::scroll::FollowScroll;

const DEFAULT_CONTENT_WIDTH: Pixels = px(640.);
const LIST_HORIZONTAL_PADDING: Pixels = px(16.);
const CONTENT_WIDTH_CHANGE_EPSILON: f32 = 1.0;
const BUBBLE_MAX_WIDTH: Pixels = px(520.);
const BUBBLE_PADDING_X: Pixels = px(12.);
const BUBBLE_PADDING_Y: Pixels = px(8.);
const SENDER_LABEL_HEIGHT: Pixels = px(16.);
const SENDER_LABEL_GAP: Pixels = px(4.);
const ESTIMATED_TEXT_LINE_HEIGHT: Pixels = px(18.);
const ESTIMATED_CHAR_WIDTH: f32 = 7.0;

/// Virtualized message history plus the typing indicator row.
pub struct MessageList {
    messages: Vec<ChatMessage>,
    typing: TypingState,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll: FollowScroll,
    content_width: Option<Pixels>,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            messages: Vec::new(),
            typing: TypingState::default(),
            item_sizes: Rc::new(Vec::new()),
            scroll: FollowScroll::new(),
            content_width: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Appends a live message, ignoring duplicate deliveries by id.
    pub fn push_message(&mut self, message: ChatMessage, cx: &mut Context<Self>) {
        if self.messages.iter().any(|existing| existing.id == message.id) {
            return;
        }

        // A sender sees their own message echoed back and stops typing.
        self.typing.stop(&message.sender_id);

        let is_own = message.is_own;
        self.messages.push(message);
        self.rebuild_item_sizes();

        if is_own {
            self.scroll.request_bottom();
        } else {
            self.scroll.request_bottom_if_following();
        }

        cx.notify();
    }

    pub fn typing_started(&mut self, user_id: impl Into<String>, cx: &mut Context<Self>) {
        if self.typing.start(user_id) {
            cx.notify();
        }
    }

    pub fn typing_stopped(&mut self, user_id: &str, cx: &mut Context<Self>) {
        if self.typing.stop(user_id) {
            cx.notify();
        }
    }

    fn update_content_width(&mut self) {
        let list_width = self.scroll.viewport_width();
        if list_width <= Pixels::ZERO {
            return;
        }

        let next_width = max_pixels(px(1.), list_width - LIST_HORIZONTAL_PADDING * 2);
        let changed = self.content_width.is_none_or(|current| {
            (f32::from(current) - f32::from(next_width)).abs() > CONTENT_WIDTH_CHANGE_EPSILON
        });

        if changed {
            self.content_width = Some(next_width);
            self.rebuild_item_sizes();
        }
    }

    fn rebuild_item_sizes(&mut self) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let sizes = self
            .messages
            .iter()
            .map(|message| size(content_width, estimate_row_height(message, content_width)))
            .collect::<Vec<_>>();

        self.item_sizes = Rc::new(sizes);
    }

    fn render_message_row(&self, message: &ChatMessage, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let text = if message.text.is_empty() {
            " ".to_string()
        } else {
            message.text.clone()
        };

        if message.is_own {
            return v_flex()
                .w_full()
                .items_end()
                .child(
                    div()
                        .max_w(BUBBLE_MAX_WIDTH)
                        .px(BUBBLE_PADDING_X)
                        .py(BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.accent)
                        .text_color(theme.accent_foreground)
                        .child(Label::new(text).text_sm()),
                )
                .into_any_element();
        }

        v_flex()
            .w_full()
            .items_start()
            .gap(SENDER_LABEL_GAP)
            .child(
                Label::new(message.display_name().to_string())
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .child(
                div()
                    .max_w(BUBBLE_MAX_WIDTH)
                    .px(BUBBLE_PADDING_X)
                    .py(BUBBLE_PADDING_Y)
                    .rounded_lg()
                    .bg(theme.muted)
                    .text_color(theme.foreground)
                    .child(Label::new(text).text_sm()),
            )
            .into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.update_content_width();
        self.scroll.update_follow_state();
        self.scroll.apply();

        let theme = cx.theme();
        let typing_label = self.typing.indicator_label();

        v_flex()
            .size_full()
            .min_h_0()
            .child(
                v_virtual_list(
                    cx.entity().clone(),
                    "channel-messages",
                    self.item_sizes.clone(),
                    |this, visible_range, _window, cx| {
                        visible_range
                            .filter_map(|index| {
                                this.messages
                                    .get(index)
                                    .cloned()
                                    .map(|message| this.render_message_row(&message, cx))
                            })
                            .collect::<Vec<_>>()
                    },
                )
                .size_full()
                .px_4()
                .py_3()
                .gap_3()
                .track_scroll(self.scroll.handle()),
            )
            .when_some(typing_label, |column, label| {
                column.child(
                    h_flex()
                        .w_full()
                        .items_center()
                        .gap_2()
                        .px_4()
                        .py_1()
                        .child(div().size(px(6.)).rounded_full().bg(theme.primary))
                        .child(
                            Label::new(label)
                                .text_xs()
                                .text_color(theme.muted_foreground),
                        ),
                )
            })
    }
}

fn estimate_row_height(message: &ChatMessage, content_width: Pixels) -> Pixels {
    let bubble_width = min_pixels(content_width, BUBBLE_MAX_WIDTH);
    let text_width = max_pixels(px(1.), bubble_width - BUBBLE_PADDING_X * 2);
    let bubble_height = estimate_text_height(&message.text, text_width) + BUBBLE_PADDING_Y * 2;

    if message.is_own {
        bubble_height
    } else {
        SENDER_LABEL_HEIGHT + SENDER_LABEL_GAP + bubble_height
    }
}

fn estimate_text_height(text: &str, width: Pixels) -> Pixels {
    if text.is_empty() {
        return ESTIMATED_TEXT_LINE_HEIGHT;
    }

    let chars_per_line = (f32::from(width) / ESTIMATED_CHAR_WIDTH).floor().max(1.0) as usize;
    let mut line_count = 0usize;
    for line in text.lines() {
        let char_count = line.chars().count().max(1);
        line_count += char_count.div_ceil(chars_per_line);
    }

    ESTIMATED_TEXT_LINE_HEIGHT * line_count.max(1)
}

fn max_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) >= f32::from(b) { a } else { b }
}

fn min_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) <= f32::from(b) { a } else { b }
}

#[cfg(test)]
mod tests {
    use gpui::{Pixels, px};

    use super::{ChatMessage, SENDER_LABEL_GAP, SENDER_LABEL_HEIGHT, estimate_row_height};
    use crate::chat::message::MessageId;

    fn message(id: &str, text: &str, is_own: bool) -> ChatMessage {
        ChatMessage {
            id: MessageId(id.to_string()),
            sender_id: "bob".to_string(),
            sender_name: None,
            text: text.to_string(),
            is_own,
        }
    }

    #[test]
    fn row_height_estimates_are_positive_and_grow_with_content() {
        let width = px(640.);
        let short = estimate_row_height(&message("m-1", "hi", false), width);
        let long = estimate_row_height(
            &message("m-2", &"orbital mechanics ".repeat(40), false),
            width,
        );

        assert!(short > Pixels::ZERO);
        assert!(long > short);
    }

    #[test]
    fn own_rows_skip_the_sender_label() {
        let width = px(640.);
        let own = estimate_row_height(&message("m-1", "hi", true), width);
        let other = estimate_row_height(&message("m-2", "hi", false), width);

        assert_eq!(other - own, SENDER_LABEL_HEIGHT + SENDER_LABEL_GAP);
    }
}
