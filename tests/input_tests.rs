//! Input Integration Tests
//!
//! Tests for:
//! - Key and mouse edge detection across frames
//! - Mouse and scroll deltas
//! - Bounded event channel: publish order, drops, drop hook
//! - Publishing from other threads
//! - Input service binding on the tree

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use glam::Vec2;
use grove::errors::GroveError;
use grove::input::{ButtonState, Input, InputChannel, InputEvent, Key, MouseButton};
use grove::scene::SceneTree;

fn key(key: Key, state: ButtonState) -> InputEvent {
    InputEvent::Key { key, state }
}

// ============================================================================
// Edge detection
// ============================================================================

#[test]
fn input_key_edges_last_one_frame() {
    let mut input = Input::new();

    input.start_frame();
    input.inject_key(Key::Space, ButtonState::Pressed);
    assert!(input.get_key(Key::Space));
    assert!(input.get_key_down(Key::Space));
    assert!(!input.get_key_up(Key::Space));

    input.start_frame();
    assert!(input.get_key(Key::Space));
    assert!(!input.get_key_down(Key::Space));

    input.inject_key(Key::Space, ButtonState::Released);
    assert!(input.get_key_up(Key::Space));
    assert!(input.get_key_released(Key::Space));

    input.start_frame();
    assert!(input.get_key_up(Key::Space));
    assert!(!input.get_key_released(Key::Space));
}

#[test]
fn input_repeated_press_is_not_a_new_edge() {
    let mut input = Input::new();
    input.inject_key(Key::A, ButtonState::Pressed);
    input.start_frame();
    input.inject_key(Key::A, ButtonState::Pressed);
    assert!(!input.get_key_down(Key::A));
    assert!(input.get_key(Key::A));
}

#[test]
fn input_mouse_buttons_and_deltas() {
    let mut input = Input::new();
    input.start_frame();
    input.apply(&InputEvent::MouseButton {
        button: MouseButton::Left,
        state: ButtonState::Pressed,
    });
    input.apply(&InputEvent::MouseMoved {
        position: Vec2::new(10.0, 5.0),
    });
    input.apply(&InputEvent::MouseMoved {
        position: Vec2::new(12.0, 6.0),
    });
    input.apply(&InputEvent::Scroll {
        delta: Vec2::new(0.0, 1.0),
    });
    input.apply(&InputEvent::Scroll {
        delta: Vec2::new(0.0, 2.0),
    });

    assert!(input.get_mouse_button(MouseButton::Left));
    assert!(input.get_mouse_button_down(MouseButton::Left));
    assert_eq!(input.mouse_position(), Vec2::new(12.0, 6.0));
    assert_eq!(input.mouse_delta(), Vec2::new(12.0, 6.0));
    assert_eq!(input.scroll_delta(), Vec2::new(0.0, 3.0));

    input.start_frame();
    assert_eq!(input.mouse_delta(), Vec2::ZERO);
    assert_eq!(input.scroll_delta(), Vec2::ZERO);
    assert_eq!(input.mouse_position(), Vec2::new(12.0, 6.0));
    assert!(!input.get_mouse_button_down(MouseButton::Left));
}

// ============================================================================
// Event channel
// ============================================================================

#[test]
fn input_channel_applies_events_in_order() {
    let channel = InputChannel::new(8);
    let publisher = channel.publisher();
    assert!(publisher.publish(key(Key::W, ButtonState::Pressed)));
    assert!(publisher.publish(key(Key::W, ButtonState::Released)));
    assert_eq!(channel.pending(), 2);

    let mut input = Input::new();
    assert_eq!(channel.drain_into(&mut input), 2);
    assert_eq!(channel.pending(), 0);

    // Pressed then released within one frame: both edges visible
    assert!(input.get_key_down(Key::W));
    assert!(input.get_key_released(Key::W));
    assert!(!input.get_key(Key::W));
}

#[test]
fn input_full_channel_drops_and_counts() {
    let channel = InputChannel::new(2);
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let publisher = channel.publisher().with_drop_hook({
        let hook_calls = Arc::clone(&hook_calls);
        move |event| {
            assert_eq!(*event, InputEvent::Key {
                key: Key::Escape,
                state: ButtonState::Pressed,
            });
            hook_calls.fetch_add(1, Ordering::SeqCst);
        }
    });

    assert!(publisher.publish(key(Key::A, ButtonState::Pressed)));
    assert!(publisher.publish(key(Key::B, ButtonState::Pressed)));
    assert!(!publisher.publish(key(Key::Escape, ButtonState::Pressed)));
    assert!(!publisher.publish(key(Key::Escape, ButtonState::Pressed)));

    assert_eq!(channel.dropped_count(), 2);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 2);

    let mut input = Input::new();
    channel.drain_into(&mut input);
    assert!(input.get_key(Key::A));
    assert!(input.get_key(Key::B));
    assert!(!input.get_key(Key::Escape));

    // Capacity is available again after draining
    assert!(publisher.publish(key(Key::C, ButtonState::Pressed)));
}

#[test]
fn input_publishers_work_across_threads() {
    let channel = InputChannel::new(64);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let publisher = channel.publisher();
            thread::spawn(move || {
                for _ in 0..8 {
                    publisher.publish(InputEvent::Scroll { delta: Vec2::ONE });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut input = Input::new();
    assert_eq!(channel.drain_into(&mut input), 32);
    assert_eq!(channel.dropped_count(), 0);
    assert_eq!(input.scroll_delta(), Vec2::splat(32.0));
}

// ============================================================================
// Service binding
// ============================================================================

#[test]
fn input_service_unbound_is_an_error() {
    let mut tree = SceneTree::new();
    assert!(matches!(tree.input(), Err(GroveError::ServiceUnbound("input"))));

    tree.services.bind_input(Input::new());
    tree.input_mut()
        .unwrap()
        .inject_key(Key::Enter, ButtonState::Pressed);
    assert!(tree.input().unwrap().get_key(Key::Enter));

    assert!(tree.services.unbind_input().is_some());
    assert!(tree.input().is_err());
}
