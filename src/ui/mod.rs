/// UI building blocks for the editor window
///
/// - `menu` derives which actions are available
/// - `canvas` lets the user drag captions around the preview
/// - `caption_dialog` is the caption entry form
/// - `pic_info` is the screen shown after a successful save

pub mod canvas;
pub mod caption_dialog;
pub mod menu;
pub mod pic_info;
