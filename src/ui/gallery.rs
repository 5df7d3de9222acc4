use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Color, Element, Fill};

use crate::api::models::{GeneratedImage, World3D};
use crate::state::Gallery;
use crate::Message;

const MUTED: Color = Color::from_rgb(0.612, 0.639, 0.686);

/// Sidebar list of generated panoramas, newest first
///
/// The selected row is highlighted; every row carries a delete button.
pub fn image_gallery(images: &Gallery<GeneratedImage>) -> Element<'_, Message> {
    let mut list = column![].spacing(8);

    if images.is_empty() {
        list = list.push(text("No panoramas yet").size(12).color(MUTED));
    }

    for image in images.items() {
        let selected = images.is_current(&image.id);

        let label = column![
            text(&image.scenario).size(14),
            text(image.created_label()).size(11).color(MUTED),
        ]
        .spacing(2);

        let select = button(label)
            .style(if selected {
                button::primary
            } else {
                button::secondary
            })
            .width(Fill)
            .on_press(Message::ImageSelected(image.id.clone()));

        let delete = button(text("🗑️").size(12))
            .style(button::danger)
            .on_press(Message::DeleteImagePressed(image.id.clone()));

        list = list.push(row![select, delete].spacing(6));
    }

    panel("Gallery", list.into())
}

/// Sidebar list of generated 3D worlds
pub fn world_gallery(worlds: &Gallery<World3D>) -> Element<'_, Message> {
    let mut list = column![].spacing(8);

    if worlds.is_empty() {
        list = list.push(text("No worlds generated yet").size(12).color(MUTED));
    }

    for world in worlds.items() {
        let selected = worlds.is_current(&world.id);

        let label = column![
            text(&world.scenario).size(14),
            text(world.created_label()).size(11).color(MUTED),
        ]
        .spacing(2);

        list = list.push(
            button(label)
                .style(if selected {
                    button::primary
                } else {
                    button::secondary
                })
                .width(Fill)
                .on_press(Message::WorldSelected(world.id.clone())),
        );
    }

    panel("3D Worlds", list.into())
}

fn panel<'a>(title: &'a str, list: Element<'a, Message>) -> Element<'a, Message> {
    container(
        column![
            text(title).size(18),
            container(scrollable(list)).max_height(384),
        ]
        .spacing(12),
    )
    .padding(16)
    .style(container::rounded_box)
    .into()
}
