/// Caption state for the photo being edited
///
/// A layer holds up to two lines of text (top and bottom) and, for each line
/// that has text, the pixel position it is drawn at. Positions are in the
/// source image's coordinate space: `x` is the horizontal centre of the
/// caption, `y` the top edge of its glyph box.

use crate::render::compositor;

/// Which of the two caption lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptionLine {
    Top,
    Bottom,
}

impl CaptionLine {
    pub const ALL: [CaptionLine; 2] = [CaptionLine::Top, CaptionLine::Bottom];

    fn index(self) -> usize {
        match self {
            CaptionLine::Top => 0,
            CaptionLine::Bottom => 1,
        }
    }
}

/// Text plus position; keeping them together means a position can't
/// outlive its text
#[derive(Debug, Clone, PartialEq, Eq)]
struct Caption {
    text: String,
    position: (i32, i32),
}

/// Captions overlaid on one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLayer {
    width: u32,
    height: u32,
    captions: [Option<Caption>; 2],
}

impl CaptionLayer {
    /// Empty layer for an image of `width` x `height` pixels
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            captions: [None, None],
        }
    }

    /// Replace both captions at once
    ///
    /// Blank text (empty or whitespace only) counts as absent. A line that
    /// gains text gets the default position for that line; a line that
    /// already had text keeps wherever the user put it.
    pub fn set_captions(&mut self, top: Option<&str>, bottom: Option<&str>) {
        for (line, text) in [(CaptionLine::Top, top), (CaptionLine::Bottom, bottom)] {
            let default = self.default_position(line);
            let slot = &mut self.captions[line.index()];
            *slot = match (slot.take(), non_blank(text)) {
                (Some(existing), Some(text)) => Some(Caption {
                    text: text.to_string(),
                    position: existing.position,
                }),
                (None, Some(text)) => Some(Caption {
                    text: text.to_string(),
                    position: default,
                }),
                (_, None) => None,
            };
        }
    }

    /// Override positions as `[top_x, top_y, bottom_x, bottom_y]`
    ///
    /// Entries belonging to a line without text are ignored.
    pub fn set_positions(&mut self, positions: Option<[i32; 4]>) {
        let Some(p) = positions else {
            return;
        };
        self.set_position(CaptionLine::Top, p[0], p[1]);
        self.set_position(CaptionLine::Bottom, p[2], p[3]);
    }

    /// Move a single caption. Returns false if that line has no text.
    pub fn set_position(&mut self, line: CaptionLine, x: i32, y: i32) -> bool {
        match &mut self.captions[line.index()] {
            Some(caption) => {
                caption.position = (x, y);
                true
            }
            None => false,
        }
    }

    /// Current positions as `[top_x, top_y, bottom_x, bottom_y]`, zero for absent lines
    pub fn positions(&self) -> [i32; 4] {
        let (tx, ty) = self.position(CaptionLine::Top).unwrap_or((0, 0));
        let (bx, by) = self.position(CaptionLine::Bottom).unwrap_or((0, 0));
        [tx, ty, bx, by]
    }

    /// Drop both captions and their positions
    pub fn clear(&mut self) {
        self.captions = [None, None];
    }

    pub fn has_valid_caption(&self) -> bool {
        self.captions.iter().any(Option::is_some)
    }

    pub fn text(&self, line: CaptionLine) -> Option<&str> {
        self.captions[line.index()].as_ref().map(|c| c.text.as_str())
    }

    pub fn position(&self, line: CaptionLine) -> Option<(i32, i32)> {
        self.captions[line.index()].as_ref().map(|c| c.position)
    }

    /// Text and position of a line, if it has text
    pub fn caption(&self, line: CaptionLine) -> Option<(&str, (i32, i32))> {
        self.captions[line.index()]
            .as_ref()
            .map(|c| (c.text.as_str(), c.position))
    }

    pub fn top(&self) -> Option<&str> {
        self.text(CaptionLine::Top)
    }

    pub fn bottom(&self) -> Option<&str> {
        self.text(CaptionLine::Bottom)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn default_position(&self, line: CaptionLine) -> (i32, i32) {
        let line_height = compositor::line_height(self.width);
        let x = (self.width / 2) as i32;
        let y = match line {
            CaptionLine::Top => line_height / 2,
            CaptionLine::Bottom => self.height.saturating_sub(line_height * 3 / 2),
        };
        (x, y as i32)
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_layer_has_no_caption() {
        let layer = CaptionLayer::new(640, 480);
        assert!(!layer.has_valid_caption());
        assert_eq!(layer.positions(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_non_empty_captions_are_valid() {
        let mut layer = CaptionLayer::new(640, 480);

        layer.set_captions(Some("I CAN HAS"), None);
        assert!(layer.has_valid_caption());

        layer.set_captions(None, Some("CHEEZBURGER"));
        assert!(layer.has_valid_caption());
        assert_eq!(layer.top(), None);
        assert_eq!(layer.bottom(), Some("CHEEZBURGER"));
    }

    #[test]
    fn test_blank_captions_are_not_valid() {
        let mut layer = CaptionLayer::new(640, 480);
        layer.set_captions(Some("   "), Some(""));

        assert!(!layer.has_valid_caption());
        assert_eq!(layer.position(CaptionLine::Top), None);
        assert_eq!(layer.position(CaptionLine::Bottom), None);
    }

    #[test]
    fn test_new_text_gets_default_positions() {
        let mut layer = CaptionLayer::new(640, 480);
        layer.set_captions(Some("OH HAI"), Some("KTHXBYE"));

        // 640px wide -> glyph scale 5 -> 40px lines
        assert_eq!(layer.position(CaptionLine::Top), Some((320, 20)));
        assert_eq!(layer.position(CaptionLine::Bottom), Some((320, 480 - 60)));
    }

    #[test]
    fn test_editing_text_keeps_moved_position() {
        let mut layer = CaptionLayer::new(640, 480);
        layer.set_captions(Some("OH HAI"), None);
        assert!(layer.set_position(CaptionLine::Top, 100, 200));

        layer.set_captions(Some("OH HAI THAR"), None);
        assert_eq!(layer.caption(CaptionLine::Top), Some(("OH HAI THAR", (100, 200))));
    }

    #[test]
    fn test_removed_text_loses_position() {
        let mut layer = CaptionLayer::new(640, 480);
        layer.set_captions(Some("OH HAI"), Some("KTHXBYE"));
        layer.set_captions(Some("OH HAI"), None);

        assert_eq!(layer.position(CaptionLine::Bottom), None);
        assert!(!layer.set_position(CaptionLine::Bottom, 1, 1));

        // Coming back starts from the default again
        layer.set_position(CaptionLine::Top, 5, 5);
        layer.set_captions(Some("OH HAI"), Some("KTHXBYE"));
        assert_eq!(layer.position(CaptionLine::Bottom), Some((320, 420)));
    }

    #[test]
    fn test_set_positions_ignores_absent_lines() {
        let mut layer = CaptionLayer::new(640, 480);
        layer.set_captions(Some("OH HAI"), None);
        layer.set_positions(Some([10, 20, 30, 40]));

        assert_eq!(layer.positions(), [10, 20, 0, 0]);

        layer.set_positions(None);
        assert_eq!(layer.positions(), [10, 20, 0, 0]);
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut layer = CaptionLayer::new(640, 480);
        layer.set_captions(Some("OH HAI"), Some("KTHXBYE"));
        layer.clear();

        assert!(!layer.has_valid_caption());
        assert_eq!(layer, CaptionLayer::new(640, 480));
    }

    #[test]
    fn test_bottom_default_saturates_on_tiny_images() {
        let mut layer = CaptionLayer::new(16, 4);
        layer.set_captions(None, Some("HAI"));
        assert_eq!(layer.position(CaptionLine::Bottom), Some((8, 0)));
    }
}
