mod api;
mod config;
mod copy;
mod error;
mod logging;
mod related;
mod session;

use iced::{
    alignment,
    event::{self, Event as IcedEvent},
    keyboard::{self, Key},
    time,
    widget::{
        button, center, column, container, opaque, pick_list, row, scrollable, stack, text,
        text_input, Column,
    },
    window, Element, Font, Length, Subscription, Task, Theme,
};
use std::time::{Duration, Instant};

use api::{ClientError, GenerationClient, GenerationResult};
use copy::{CopyFeedback, SystemClipboard, COPY_LABEL};
use error::ControllerError;
use session::{Role, Session};

const LOADING_FRAMES: [&str; 10] = [
    "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
];

fn main() -> iced::Result {
    logging::init();
    let config = config::Config::load();
    let size = iced::Size::new(config.window.width as f32, config.window.height as f32);

    iced::application("Reply Desk", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size,
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(move || App::new(config))
}

#[derive(Debug, Clone)]
enum Message {
    InputChanged(String),
    ContextSelected(String),
    Submit,
    Generated {
        message: String,
        outcome: Result<GenerationResult, ClientError>,
    },
    Regenerate,
    Regenerated(Result<GenerationResult, ClientError>),
    Copy,
    CopyFeedbackElapsed,
    DismissNotice,
    Tick,
    Exit,
}

struct App {
    session: Session,
    companies: Vec<String>,
    client: GenerationClient,
    clipboard: SystemClipboard,
    copy_feedback: CopyFeedback,
    notice: Option<&'static str>,
    loading_frame: usize,
    input_id: text_input::Id,
    transcript_id: scrollable::Id,
}

impl App {
    fn new(config: config::Config) -> (Self, Task<Message>) {
        let client = GenerationClient::from_env_or(&config.service.host);
        tracing::info!(host = %client.base_url(), "using generation service");

        let input_id = text_input::Id::unique();

        let app = App {
            session: Session::new(config.companies.initial()),
            companies: config.companies.options.clone(),
            client,
            clipboard: SystemClipboard::default(),
            copy_feedback: CopyFeedback::new(COPY_LABEL, config.feedback.copy_window()),
            notice: None,
            loading_frame: 0,
            input_id: input_id.clone(),
            transcript_id: scrollable::Id::unique(),
        };

        (app, text_input::focus(input_id))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        if self.notice.is_some() {
            match message {
                // Enter in the input acknowledges the notice instead of resending.
                Message::Submit => return self.update(Message::DismissNotice),
                Message::InputChanged(_) | Message::Regenerate | Message::Copy => {
                    return Task::none();
                }
                _ => {}
            }
        }

        match message {
            Message::InputChanged(value) => {
                self.session.set_input(value);
                Task::none()
            }
            Message::ContextSelected(company) => {
                tracing::debug!(company = %company, "company selected");
                self.session.set_context(company);
                Task::none()
            }
            Message::Submit => match self.session.begin_submit() {
                Ok(request) => {
                    let client = self.client.clone();
                    let scroll = self.scroll_transcript();
                    let call = Task::future(async move {
                        let outcome = client.generate(&request).await;
                        Message::Generated {
                            message: request.message,
                            outcome,
                        }
                    });
                    Task::batch([scroll, call])
                }
                Err(e) => self.report(e),
            },
            Message::Generated { message, outcome } => {
                match self.session.finish_submit(message, outcome) {
                    Ok(()) => self.scroll_transcript(),
                    Err(e) => self.report(e),
                }
            }
            Message::Regenerate => match self.session.begin_regenerate() {
                Ok(Some(request)) => {
                    let client = self.client.clone();
                    Task::future(async move {
                        Message::Regenerated(client.generate(&request).await)
                    })
                }
                Ok(None) => Task::none(),
                Err(e) => self.report(e),
            },
            Message::Regenerated(outcome) => match self.session.finish_regenerate(outcome) {
                Ok(()) => Task::none(),
                Err(e) => self.report(e),
            },
            Message::Copy if !self.session.can_copy() => Task::none(),
            Message::Copy => {
                match self
                    .session
                    .copy_answer(&mut self.clipboard, &mut self.copy_feedback, Instant::now())
                {
                    Ok(()) => {
                        let window = self.copy_feedback.window();
                        Task::perform(tokio::time::sleep(window), |_| Message::CopyFeedbackElapsed)
                    }
                    Err(e) => self.report(e),
                }
            }
            Message::CopyFeedbackElapsed => {
                self.copy_feedback.expire(Instant::now());
                Task::none()
            }
            Message::DismissNotice => {
                self.notice = None;
                text_input::focus(self.input_id.clone())
            }
            Message::Tick => {
                if self.session.is_busy() {
                    self.loading_frame = (self.loading_frame + 1) % LOADING_FRAMES.len();
                }
                Task::none()
            }
            Message::Exit => iced::exit(),
        }
    }

    fn report(&mut self, error: ControllerError) -> Task<Message> {
        match error {
            // Controls are disabled while busy; a stray Enter lands here.
            ControllerError::Busy => tracing::debug!("ignoring trigger while busy"),
            other => self.notice = Some(other.notice()),
        }
        Task::none()
    }

    fn scroll_transcript(&self) -> Task<Message> {
        scrollable::snap_to(self.transcript_id.clone(), scrollable::RelativeOffset::END)
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.session.is_busy() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::Exit)
            } else {
                None
            }
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<Message> {
        let enabled = self.session.controls_enabled() && self.notice.is_none();

        let selector = row![
            text("Company").size(14),
            pick_list(
                self.companies.as_slice(),
                Some(self.session.selected_context().to_string()),
                Message::ContextSelected,
            )
        ]
        .spacing(10)
        .align_y(alignment::Vertical::Center);

        let transcript = scrollable(
            Column::with_children(self.session.transcript().entries().iter().map(
                |entry| -> Element<Message> {
                    let (who, align) = match entry.role {
                        Role::User => ("Customer", alignment::Horizontal::Left),
                        Role::Agent => ("Agent", alignment::Horizontal::Right),
                    };
                    let bubble = column![text(who).size(12), text(entry.text.as_str()).size(15)];
                    container(bubble.spacing(4))
                        .padding(10)
                        .width(Length::Fill)
                        .align_x(align)
                        .into()
                },
            ))
            .spacing(8)
            .padding(10),
        )
        .id(self.transcript_id.clone())
        .height(Length::FillPortion(3));

        let transcript: Element<Message> = if self.session.transcript().is_empty() {
            container(text("No messages yet").size(14))
                .padding(10)
                .height(Length::FillPortion(3))
                .into()
        } else {
            transcript.into()
        };

        let input = text_input("Type the customer's message...", self.session.input())
            .on_input(Message::InputChanged)
            .on_submit(Message::Submit)
            .padding(15)
            .size(16)
            .id(self.input_id.clone());

        let copy_label = self.copy_feedback.label(Instant::now()).to_string();
        let actions = row![
            button(text(self.session.submit_label()).size(14))
                .on_press_maybe(enabled.then_some(Message::Submit))
                .padding(10),
            button(text("Regenerate").size(14))
                .on_press_maybe(
                    (enabled && self.session.can_regenerate()).then_some(Message::Regenerate),
                )
                .padding(10),
            button(text(copy_label).size(14))
                .on_press_maybe((enabled && self.session.can_copy()).then_some(Message::Copy))
                .padding(10),
        ]
        .spacing(10);

        let answer: Element<Message> = if self.session.is_busy() {
            let frame = LOADING_FRAMES[self.loading_frame];
            text(format!("{} Generating a reply...", frame)).size(15).into()
        } else {
            text(self.session.answer()).size(15).into()
        };

        let answer_panel = container(
            column![text("Generated Response").size(13), answer].spacing(6),
        )
        .padding(12)
        .width(Length::Fill)
        .style(container::rounded_box);

        let related = scrollable(
            Column::with_children(related::cards(self.session.related()).into_iter().map(
                |card| -> Element<Message> {
                    container(
                        column![
                            row![text(card.header).size(13), text(card.score).size(13)]
                                .spacing(12),
                            text(format!("Customer: {}", card.customer)).size(14),
                            text(format!("Agent: {}", card.agent)).size(14),
                        ]
                        .spacing(4),
                    )
                    .padding(10)
                    .width(Length::Fill)
                    .style(container::rounded_box)
                    .into()
                },
            ))
            .spacing(8),
        )
        .height(Length::FillPortion(2));

        let content = container(
            column![
                selector,
                transcript,
                input,
                actions,
                answer_panel,
                text("Similar Tweets").size(13),
                related
            ]
            .spacing(10)
            .padding(10),
        )
        .width(Length::Fill)
        .height(Length::Fill);

        match self.notice {
            Some(notice) => {
                let dialog = container(
                    column![
                        text(notice).size(15),
                        button(text("OK").size(14)).on_press(Message::DismissNotice).padding(10)
                    ]
                    .spacing(12)
                    .align_x(alignment::Horizontal::Center),
                )
                .padding(20)
                .style(container::rounded_box);

                stack![content, opaque(center(dialog))].into()
            }
            None => content.into(),
        }
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_submit(app: &mut App, message: &str) {
        let _ = app.update(Message::InputChanged(message.to_string()));
        let _ = app.update(Message::Submit);
        let _ = app.update(Message::Generated {
            message: message.to_string(),
            outcome: Err(ClientError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                detail: String::new(),
            }),
        });
    }

    #[test]
    fn test_enter_behind_notice_dismisses_instead_of_resending() {
        let (mut app, _) = App::new(config::Config::default());
        failed_submit(&mut app, "Where is my order?");
        assert_eq!(app.notice, Some("Failed to generate response. Please try again."));
        assert_eq!(app.session.transcript().len(), 1);

        let _ = app.update(Message::Submit);

        assert!(app.notice.is_none());
        assert!(!app.session.is_busy());
        assert_eq!(app.session.transcript().len(), 1);
        assert_eq!(app.session.input(), "Where is my order?");
    }

    #[test]
    fn test_notice_blocks_typing_and_other_actions() {
        let (mut app, _) = App::new(config::Config::default());
        failed_submit(&mut app, "Where is my order?");

        let _ = app.update(Message::InputChanged("typed behind the notice".to_string()));
        let _ = app.update(Message::Regenerate);
        let _ = app.update(Message::Copy);

        assert!(app.notice.is_some());
        assert!(!app.session.is_busy());
        assert_eq!(app.session.input(), "Where is my order?");
    }

    #[test]
    fn test_copy_before_first_answer_is_noop() {
        let (mut app, _) = App::new(config::Config::default());

        let _ = app.update(Message::Copy);

        assert!(app.notice.is_none());
        assert_eq!(app.copy_feedback.label(Instant::now()), COPY_LABEL);
    }
}
