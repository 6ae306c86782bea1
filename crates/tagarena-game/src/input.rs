/// Normalized movement direction for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveIntent {
    pub dx: f32,
    pub dy: f32,
}

impl MoveIntent {
    /// Combine pressed directions into a unit vector. Diagonals are
    /// normalized so they are no faster than straight movement.
    pub fn from_directions(up: bool, down: bool, left: bool, right: bool) -> Self {
        let mut dx: f32 = 0.0;
        let mut dy: f32 = 0.0;
        if up {
            dy -= 1.0;
        }
        if down {
            dy += 1.0;
        }
        if left {
            dx -= 1.0;
        }
        if right {
            dx += 1.0;
        }

        let length = (dx * dx + dy * dy).sqrt();
        if length > 0.0 {
            dx /= length;
            dy /= length;
        }
        Self { dx, dy }
    }

    pub fn is_idle(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Input device seam for the local player. Polled once per tick.
pub trait InputSource: Send {
    fn move_intent(&mut self) -> MoveIntent;

    /// One-shot boost edge. Returns true at most once per physical press;
    /// holding the key does not re-fire.
    fn consume_boost_press(&mut self) -> bool;
}

/// Input source that never moves. For driven or spectating sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInput;

impl InputSource for NullInput {
    fn move_intent(&mut self) -> MoveIntent {
        MoveIntent::default()
    }

    fn consume_boost_press(&mut self) -> bool {
        false
    }
}

/// Movement keys the simulation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Pressed-key state fed by the UI layer.
#[derive(Debug, Default, Clone)]
pub struct KeyboardState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    boost_held: bool,
    boost_just_pressed: bool,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.up = true,
            Direction::Down => self.down = true,
            Direction::Left => self.left = true,
            Direction::Right => self.right = true,
        }
    }

    pub fn release(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.up = false,
            Direction::Down => self.down = false,
            Direction::Left => self.left = false,
            Direction::Right => self.right = false,
        }
    }

    /// Boost key went down. OS key repeat delivers repeats while held;
    /// only the first edge latches.
    pub fn press_boost(&mut self) {
        if !self.boost_held {
            self.boost_held = true;
            self.boost_just_pressed = true;
        }
    }

    pub fn release_boost(&mut self) {
        self.boost_held = false;
    }

    /// Drop all pressed state, as when the window loses focus.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl InputSource for KeyboardState {
    fn move_intent(&mut self) -> MoveIntent {
        MoveIntent::from_directions(self.up, self.down, self.left, self.right)
    }

    fn consume_boost_press(&mut self) -> bool {
        let pressed = self.boost_just_pressed;
        self.boost_just_pressed = false;
        pressed
    }
}
