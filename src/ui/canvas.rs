use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme, Vector};

use crate::render::compositor::{self, CaptionRect};
use crate::state::caption::{CaptionLayer, CaptionLine};
use crate::Message;

/// Transparent layer over the photo preview that lets captions be dragged
///
/// The preview is drawn with `ContentFit::Contain`, so cursor positions
/// are mapped back into image pixels the same way before hit testing.
pub struct CaptionDragger {
    image_size: (u32, u32),
    /// Bounds and anchor of each caption, indexed like `CaptionLine::ALL`
    captions: [Option<(CaptionRect, (i32, i32))>; 2],
    enabled: bool,
}

impl CaptionDragger {
    pub fn new(layer: &CaptionLayer, enabled: bool) -> Self {
        let image_size = layer.dimensions();
        let bounds = compositor::caption_bounds(layer, image_size.0);
        let mut captions = [None, None];
        for (i, line) in CaptionLine::ALL.into_iter().enumerate() {
            captions[i] = bounds[i].zip(layer.position(line));
        }

        Self {
            image_size,
            captions,
            enabled,
        }
    }

    /// Caption under an image-space point. Bottom wins, it's drawn last.
    fn hit(&self, point: Point) -> Option<(CaptionLine, CaptionRect, (i32, i32))> {
        CaptionLine::ALL
            .into_iter()
            .zip(self.captions)
            .rev()
            .find_map(|(line, caption)| {
                caption
                    .filter(|(rect, _)| rect.contains(point.x, point.y))
                    .map(|(rect, anchor)| (line, rect, anchor))
            })
    }
}

impl Program<Message> for CaptionDragger {
    type State = DragState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if !self.enabled {
            state.drag = None;
            return (canvas::event::Status::Ignored, None);
        }
        let Some(fit) = ContainFit::new(self.image_size, bounds.size()) else {
            return (canvas::event::Status::Ignored, None);
        };

        match event {
            // Mouse button press - pick up the caption under the cursor
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    let point = fit.to_image(position);
                    if let Some((line, rect, anchor)) = self.hit(point) {
                        state.drag = Some(Drag {
                            line,
                            rect,
                            anchor,
                            grab: point,
                            current: point,
                        });
                        return (canvas::event::Status::Captured, None);
                    }
                }
            }

            // Mouse move - follow the cursor while dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if let Some(drag) = state.drag.as_mut() {
                    if let Some(position) = cursor.position_in(bounds) {
                        drag.current = fit.to_image(position);
                        return (canvas::event::Status::Captured, None);
                    }
                }
            }

            // Mouse button release - drop the caption
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if let Some(drag) = state.drag.take() {
                    let (x, y) = drag.dropped_at();
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::CaptionMoved(drag.line, x, y)),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        if let (Some(drag), Some(fit)) = (&state.drag, ContainFit::new(self.image_size, bounds.size())) {
            let outline = fit.to_screen(&drag.moved_rect());
            let path = Path::rectangle(outline.position(), outline.size());
            frame.stroke(
                &path,
                Stroke::default()
                    .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.8))
                    .with_width(2.0),
            );
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.drag.is_some() {
            return mouse::Interaction::Grabbing;
        }
        let over_caption = self.enabled
            && ContainFit::new(self.image_size, bounds.size())
                .zip(cursor.position_in(bounds))
                .and_then(|(fit, position)| self.hit(fit.to_image(position)))
                .is_some();

        if over_caption {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    drag: Option<Drag>,
}

/// A caption being dragged, in image coordinates
#[derive(Debug, Clone, Copy)]
struct Drag {
    line: CaptionLine,
    rect: CaptionRect,
    anchor: (i32, i32),
    grab: Point,
    current: Point,
}

impl Drag {
    fn delta(&self) -> (i32, i32) {
        (
            (self.current.x - self.grab.x).round() as i32,
            (self.current.y - self.grab.y).round() as i32,
        )
    }

    /// Anchor position the caption ends up at
    fn dropped_at(&self) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (self.anchor.0 + dx, self.anchor.1 + dy)
    }

    fn moved_rect(&self) -> CaptionRect {
        let (dx, dy) = self.delta();
        CaptionRect {
            x: self.rect.x + dx,
            y: self.rect.y + dy,
            ..self.rect
        }
    }
}

/// Mapping between widget space and image space for a contain-fit image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    scale: f32,
    offset: Vector,
}

impl ContainFit {
    pub fn new((width, height): (u32, u32), bounds: Size) -> Option<Self> {
        if width == 0 || height == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
            return None;
        }
        let scale = (bounds.width / width as f32).min(bounds.height / height as f32);
        let offset = Vector::new(
            (bounds.width - width as f32 * scale) / 2.0,
            (bounds.height - height as f32 * scale) / 2.0,
        );
        Some(Self { scale, offset })
    }

    pub fn to_image(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.offset.x) / self.scale,
            (point.y - self.offset.y) / self.scale,
        )
    }

    pub fn to_screen(&self, rect: &CaptionRect) -> Rectangle {
        Rectangle {
            x: rect.x as f32 * self.scale + self.offset.x,
            y: rect.y as f32 * self.scale + self.offset.y,
            width: rect.width as f32 * self.scale,
            height: rect.height as f32 * self.scale,
        }
    }
}
