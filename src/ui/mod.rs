//! User interface module
//!
//! The rendering surface for the gallery core:
//! - The masonry grid and its composition logic (grid.rs)
//! - The single-photo detail page (detail.rs)
//! - GPU handles for cached blobs (textures.rs)

pub mod detail;
pub mod grid;
pub mod textures;

use iced::widget::{container, text};
use iced::{Background, Border, Color, Element, Length};

use crate::Message;

/// Sized placeholder shown while a photo has no pixels yet
pub fn skeleton<'a>(width: f32, height: f32) -> Element<'a, Message> {
    container(text(""))
        .width(Length::Fixed(width))
        .height(Length::Fixed(height))
        .style(|_theme| container::Style {
            background: Some(Background::Color(Color::from_rgb8(0x2a, 0x2a, 0x2e))),
            border: Border {
                radius: 8.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}
