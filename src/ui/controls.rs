use iced::widget::{button, column, container, pick_list, text};
use iced::{Center, Color, Element, Fill};

use crate::api::models::Scenario;
use crate::{ApiStatus, Message};

const WARNING: Color = Color::from_rgb(0.917, 0.702, 0.031);
const MUTED: Color = Color::from_rgb(0.612, 0.639, 0.686);

/// Scenario picker and the two generation triggers
///
/// Pure view: emits messages, performs no network I/O. The generate
/// button stays enabled while the health probe is still in flight;
/// only a known-offline API disables it.
pub fn generation_panel<'a>(
    selected: Scenario,
    generating_image: bool,
    generating_world: bool,
    has_current_image: bool,
    api_status: ApiStatus,
) -> Element<'a, Message> {
    let mut content = column![text("Generate Panorama").size(18)].spacing(12);

    if api_status == ApiStatus::Offline {
        content = content.push(
            text("⚠️ API disconnected - check connection above")
                .size(12)
                .color(WARNING),
        );
    }

    content = content.push(
        column![
            text("Scenario").size(13),
            pick_list(&Scenario::ALL[..], Some(selected), Message::ScenarioPicked).width(Fill),
        ]
        .spacing(6),
    );

    let generate_label = if generating_image {
        "Generating..."
    } else {
        "Generate"
    };
    content = content.push(
        button(text(generate_label).width(Fill).align_x(Center))
            .style(button::primary)
            .width(Fill)
            .padding(10)
            .on_press_maybe(
                (!generating_image && api_status != ApiStatus::Offline)
                    .then_some(Message::GeneratePressed),
            ),
    );

    let hint = if generating_image {
        "This may take 1-2 minutes depending on GPU..."
    } else {
        "Click to generate a new 360° panoramic scene"
    };
    content = content.push(text(hint).size(12).color(MUTED));

    let world_label = if generating_world {
        "Generating World..."
    } else {
        "🌐 Generate 3D World"
    };
    content = content.push(
        button(text(world_label).width(Fill).align_x(Center))
            .style(button::success)
            .width(Fill)
            .padding(10)
            .on_press_maybe(
                (has_current_image && !generating_world && api_status != ApiStatus::Offline)
                    .then_some(Message::GenerateWorldPressed),
            ),
    );

    let world_hint = if generating_world {
        "Building the 3D world, this can take a few minutes..."
    } else if has_current_image {
        "Turn the current panorama into an explorable 3D world"
    } else {
        "Generate a panorama first"
    };
    content = content.push(text(world_hint).size(12).color(MUTED));

    container(content)
        .padding(16)
        .style(container::rounded_box)
        .into()
}
