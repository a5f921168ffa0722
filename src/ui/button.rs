use sdl2::{event::Event, rect::Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    MouseOut,
    MouseOverMotion,
    MouseDown,
    MouseUp,
}

/// Hover/press tracking for a rectangular button.
#[derive(Clone, Copy, Debug)]
pub struct Button {
    state: ButtonState,
}

impl Button {
    pub fn new() -> Button {
        Button { state: ButtonState::MouseOut }
    }

    pub fn state(self: &Self) -> ButtonState {
        self.state
    }

    /// Updates the state from a mouse event over `rect`. Points on the
    /// rectangle's right and bottom edges still count as inside. Non-mouse
    /// events are ignored.
    pub fn handle_event(self: &mut Self, event: &Event, rect: Rect) -> ButtonState {
        let (x, y, pressed) = match *event {
            Event::MouseMotion { x, y, .. } => (x, y, None),
            Event::MouseButtonDown { x, y, .. } => (x, y, Some(ButtonState::MouseDown)),
            Event::MouseButtonUp { x, y, .. } => (x, y, Some(ButtonState::MouseUp)),
            _ => return self.state,
        };

        let inside = x >= rect.x()
            && x <= rect.x() + rect.width() as i32
            && y >= rect.y()
            && y <= rect.y() + rect.height() as i32;

        self.state = if !inside {
            ButtonState::MouseOut
        }
        else {
            pressed.unwrap_or(ButtonState::MouseOverMotion)
        };

        self.state
    }
}

impl Default for Button {
    fn default() -> Self {
        Button::new()
    }
}

#[cfg(test)]
mod tests {
    use sdl2::mouse::{MouseButton, MouseState};

    use super::*;

    fn motion(x: i32, y: i32) -> Event {
        Event::MouseMotion { timestamp: 0, window_id: 1, which: 0, mousestate: MouseState::from_sdl_state(0), x, y, xrel: 0, yrel: 0 }
    }

    fn down(x: i32, y: i32) -> Event {
        Event::MouseButtonDown { timestamp: 0, window_id: 1, which: 0, mouse_btn: MouseButton::Left, clicks: 1, x, y }
    }

    fn up(x: i32, y: i32) -> Event {
        Event::MouseButtonUp { timestamp: 0, window_id: 1, which: 0, mouse_btn: MouseButton::Left, clicks: 1, x, y }
    }

    #[test]
    fn follows_the_mouse_over_the_rect() {
        let rect = Rect::new(10, 10, 100, 40);
        let mut button = Button::new();

        assert_eq!(button.handle_event(&motion(50, 20), rect), ButtonState::MouseOverMotion);
        assert_eq!(button.handle_event(&down(50, 20), rect), ButtonState::MouseDown);
        assert_eq!(button.handle_event(&up(50, 20), rect), ButtonState::MouseUp);
        assert_eq!(button.handle_event(&motion(200, 20), rect), ButtonState::MouseOut);
    }

    #[test]
    fn edges_count_as_inside() {
        let rect = Rect::new(10, 10, 100, 40);
        let mut button = Button::new();

        assert_eq!(button.handle_event(&down(110, 50), rect), ButtonState::MouseDown);
        assert_eq!(button.handle_event(&motion(10, 10), rect), ButtonState::MouseOverMotion);
        assert_eq!(button.handle_event(&motion(111, 50), rect), ButtonState::MouseOut);
    }

    #[test]
    fn other_events_leave_state_alone() {
        let rect = Rect::new(0, 0, 10, 10);
        let mut button = Button::new();
        button.handle_event(&down(5, 5), rect);

        assert_eq!(button.handle_event(&Event::Quit { timestamp: 0 }, rect), ButtonState::MouseDown);
    }
}
