use iced::widget::{button, column, container, row, text, text_input};
use iced::{Alignment, Element, Length};

use crate::state::caption::{CaptionLayer, CaptionLine};
use crate::Message;

/// Id of the top caption input, focused when the dialog opens
pub fn top_input_id() -> text_input::Id {
    text_input::Id::new("caption-top")
}

/// What the user has typed so far. Nothing is applied until OK.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionDraft {
    pub top: String,
    pub bottom: String,
}

impl CaptionDraft {
    /// Start from the captions already on the photo
    pub fn from_layer(layer: &CaptionLayer) -> Self {
        Self {
            top: layer.top().unwrap_or_default().to_string(),
            bottom: layer.bottom().unwrap_or_default().to_string(),
        }
    }

    pub fn edit(&mut self, line: CaptionLine, value: String) {
        match line {
            CaptionLine::Top => self.top = value,
            CaptionLine::Bottom => self.bottom = value,
        }
    }

    /// Apply the draft to a layer
    pub fn apply(&self, layer: &mut CaptionLayer) {
        layer.set_captions(Some(&self.top), Some(&self.bottom));
    }
}

pub fn view(draft: &CaptionDraft) -> Element<'_, Message> {
    let top = text_input("Top caption", &draft.top)
        .id(top_input_id())
        .on_input(|value| Message::CaptionDraftChanged(CaptionLine::Top, value))
        .on_submit(Message::CaptionDialogOk)
        .padding(10);

    let bottom = text_input("Bottom caption", &draft.bottom)
        .on_input(|value| Message::CaptionDraftChanged(CaptionLine::Bottom, value))
        .on_submit(Message::CaptionDialogOk)
        .padding(10);

    let buttons = row![
        button("Cancel")
            .on_press(Message::CaptionDialogCancel)
            .padding(10),
        button("OK").on_press(Message::CaptionDialogOk).padding(10),
    ]
    .spacing(10);

    let content = column![text("Add captions").size(24), top, bottom, buttons]
        .spacing(16)
        .padding(30)
        .max_width(480)
        .align_x(Alignment::End);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_starts_from_layer() {
        let mut layer = CaptionLayer::new(320, 240);
        assert_eq!(CaptionDraft::from_layer(&layer), CaptionDraft::default());

        layer.set_captions(Some("OH HAI"), None);
        let draft = CaptionDraft::from_layer(&layer);
        assert_eq!(draft.top, "OH HAI");
        assert_eq!(draft.bottom, "");
    }

    #[test]
    fn test_apply_sets_both_captions() {
        let mut layer = CaptionLayer::new(320, 240);
        let mut draft = CaptionDraft::default();
        draft.edit(CaptionLine::Top, "I CAN HAS".to_string());
        draft.edit(CaptionLine::Bottom, "CHEEZBURGER".to_string());

        draft.apply(&mut layer);
        assert_eq!(layer.top(), Some("I CAN HAS"));
        assert_eq!(layer.bottom(), Some("CHEEZBURGER"));

        // Emptying a field removes that caption
        draft.edit(CaptionLine::Top, String::new());
        draft.apply(&mut layer);
        assert_eq!(layer.top(), None);
        assert!(layer.has_valid_caption());
    }
}
