//! Platform-agnostic input.
//!
//! Platform adapters translate their events into [`InputEvent`]s and publish
//! them through an [`InputPublisher`]. Publishing never blocks: when the
//! bounded channel is full the event is dropped and counted. The input system
//! drains the channel once per frame into the [`Input`] state service, which
//! game code queries through the tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::{Receiver, Sender, TrySendError};
use glam::Vec2;
use rustc_hash::FxHashSet;

/// Keyboard key enumeration (platform-agnostic)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    // Letter keys
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Number keys
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,

    // Control keys
    Space,
    Enter,
    Escape,
    Backspace,
    Tab,

    // Modifier keys
    Shift,
    Control,
    Alt,

    // Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// Mouse button enumeration
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Button state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// A raw input event produced by a platform adapter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, state: ButtonState },
    MouseButton { button: MouseButton, state: ButtonState },
    MouseMoved { position: Vec2 },
    Scroll { delta: Vec2 },
}

/// Platform-agnostic input state container
#[derive(Debug, Clone, Default)]
pub struct Input {
    // Keyboard state
    pressed_keys: FxHashSet<Key>,
    just_pressed_keys: FxHashSet<Key>,
    just_released_keys: FxHashSet<Key>,

    // Mouse button state
    pressed_mouse: FxHashSet<MouseButton>,
    just_pressed_mouse: FxHashSet<MouseButton>,
    just_released_mouse: FxHashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== System API (called by the input system) ==========

    /// Clears transient state at the start of each frame (edges and deltas)
    pub fn start_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.just_released_keys.clear();
        self.just_pressed_mouse.clear();
        self.just_released_mouse.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Applies one event to the state.
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key { key, state } => self.inject_key(key, state),
            InputEvent::MouseButton { button, state } => self.inject_mouse_button(button, state),
            InputEvent::MouseMoved { position } => self.inject_mouse_position(position),
            InputEvent::Scroll { delta } => self.scroll_delta += delta,
        }
    }

    pub fn inject_key(&mut self, key: Key, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                if self.pressed_keys.insert(key) {
                    self.just_pressed_keys.insert(key);
                }
            }
            ButtonState::Released => {
                if self.pressed_keys.remove(&key) {
                    self.just_released_keys.insert(key);
                }
            }
        }
    }

    pub fn inject_mouse_button(&mut self, button: MouseButton, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                if self.pressed_mouse.insert(button) {
                    self.just_pressed_mouse.insert(button);
                }
            }
            ButtonState::Released => {
                if self.pressed_mouse.remove(&button) {
                    self.just_released_mouse.insert(button);
                }
            }
        }
    }

    pub fn inject_mouse_position(&mut self, position: Vec2) {
        self.mouse_delta += position - self.mouse_position;
        self.mouse_position = position;
    }

    // ========== User API (for game logic queries) ==========

    /// Checks whether a key is currently held down
    #[must_use]
    pub fn get_key(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Checks whether a key went down this frame
    #[must_use]
    pub fn get_key_down(&self, key: Key) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Checks whether a key is not held
    #[must_use]
    pub fn get_key_up(&self, key: Key) -> bool {
        !self.pressed_keys.contains(&key)
    }

    /// Checks whether a key was released this frame
    #[must_use]
    pub fn get_key_released(&self, key: Key) -> bool {
        self.just_released_keys.contains(&key)
    }

    #[must_use]
    pub fn get_mouse_button(&self, button: MouseButton) -> bool {
        self.pressed_mouse.contains(&button)
    }

    #[must_use]
    pub fn get_mouse_button_down(&self, button: MouseButton) -> bool {
        self.just_pressed_mouse.contains(&button)
    }

    #[must_use]
    pub fn get_mouse_button_up(&self, button: MouseButton) -> bool {
        self.just_released_mouse.contains(&button)
    }

    #[must_use]
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement accumulated this frame
    #[must_use]
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    #[must_use]
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

// ============================================================================
// Event channel
// ============================================================================

/// Callback invoked with every event dropped on a full channel.
pub type DropHook = Arc<dyn Fn(&InputEvent) + Send + Sync>;

/// Bounded event queue between platform adapters and the input system.
pub struct InputChannel {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    dropped: Arc<AtomicU64>,
}

impl InputChannel {
    /// Creates a channel holding at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A cloneable, thread-safe publishing handle.
    #[must_use]
    pub fn publisher(&self) -> InputPublisher {
        InputPublisher {
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
            on_drop: None,
        }
    }

    /// Applies every queued event to `input` in publish order.
    ///
    /// Returns the number of events applied.
    pub fn drain_into(&self, input: &mut Input) -> usize {
        let mut count = 0;
        for event in self.receiver.try_iter() {
            input.apply(&event);
            count += 1;
        }
        count
    }

    /// Events waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Events dropped so far because the channel was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for InputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputChannel")
            .field("pending", &self.pending())
            .field("dropped", &self.dropped_count())
            .finish()
    }
}

/// Publishing side of an [`InputChannel`].
#[derive(Clone)]
pub struct InputPublisher {
    sender: Sender<InputEvent>,
    dropped: Arc<AtomicU64>,
    on_drop: Option<DropHook>,
}

impl InputPublisher {
    /// Installs a callback for events this publisher drops.
    #[must_use]
    pub fn with_drop_hook(mut self, hook: impl Fn(&InputEvent) + Send + Sync + 'static) -> Self {
        self.on_drop = Some(Arc::new(hook));
        self
    }

    /// Queues an event without blocking.
    ///
    /// Returns `false` if the event was dropped because the channel is full
    /// or the engine side is gone.
    pub fn publish(&self, event: InputEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::trace!("Input channel full, dropped {event:?}");
                if let Some(hook) = &self.on_drop {
                    hook(&event);
                }
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl std::fmt::Debug for InputPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPublisher")
            .field("has_drop_hook", &self.on_drop.is_some())
            .finish_non_exhaustive()
    }
}
