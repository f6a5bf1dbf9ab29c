//! Detail page for a single photo

use chrono::Local;
use iced::widget::{button, column, container, image, row, scrollable, text, Column};
use iced::alignment::Vertical;
use iced::{Element, Length};

use super::textures::Textures;
use crate::loader::detail::PhotoDetail;
use crate::loader::ViewState;
use crate::Message;

/// Width of the large photo
const PHOTO_WIDTH: f32 = 720.0;
/// Width of the info panel
const INFO_WIDTH: f32 = 320.0;

pub fn view<'a>(detail: &'a PhotoDetail, textures: &'a Textures) -> Element<'a, Message> {
    let back = button("Back to Grid").on_press(Message::BackToGrid).padding(10);

    if let Some(error) = detail.error() {
        return column![back, text(format!("Error: {error}")).size(18)]
            .spacing(20)
            .padding(32)
            .into();
    }

    let photo_view: Element<'a, Message> = match detail.image() {
        Some(view) => {
            let height = PHOTO_WIDTH * view.aspect_ratio;
            match (view.state, textures.handle_for(view.src.as_ref())) {
                (ViewState::Displayed, Some(handle)) => image(handle)
                    .width(Length::Fixed(PHOTO_WIDTH))
                    .height(Length::Fixed(height))
                    .into(),
                (ViewState::Failed, _) => text(view.error.unwrap_or_default()).into(),
                _ => super::skeleton(PHOTO_WIDTH, height),
            }
        }
        None => super::skeleton(PHOTO_WIDTH, PHOTO_WIDTH * 0.66),
    };

    // The API has no title, description or capture date, so the id, the
    // alt text and today's date stand in for them
    let info: Element<'a, Message> = match detail.photo() {
        Some(photo) => {
            let mut info = Column::new()
                .spacing(12)
                .push(text(format!("Image #{}", photo.id)).size(28));
            if !photo.alt.is_empty() {
                info = info.push(text(&photo.alt).size(16));
            }
            info.push(text(format!("Date taken: {}", Local::now().format("%B %-d, %Y"))).size(14))
                .push(text(format!("Photographer: {}", photo.photographer)).size(14))
                .push(text(&photo.photographer_url).size(12))
                .into()
        }
        None => column![
            super::skeleton(150.0, 36.0),
            super::skeleton(250.0, 24.0),
            super::skeleton(200.0, 24.0),
            super::skeleton(180.0, 24.0),
        ]
        .spacing(12)
        .into(),
    };

    let content = column![
        back,
        row![
            photo_view,
            container(info).width(Length::Fixed(INFO_WIDTH))
        ]
        .spacing(32)
        .align_y(Vertical::Top),
    ]
    .spacing(20)
    .padding(32);

    scrollable(content).width(Length::Fill).height(Length::Fill).into()
}
