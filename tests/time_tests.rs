//! Time Integration Tests
//!
//! Tests for:
//! - Raw delta clamping and time scaling
//! - Fixed-step budget accumulation and backlog clamping
//! - Draining the budget through `try_consume_fixed_step`

use grove::settings::TimeSettings;
use grove::utils::Time;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn drain(time: &mut Time) -> u32 {
    let mut steps = 0;
    while time.try_consume_fixed_step() {
        steps += 1;
        assert!(steps <= 1000, "fixed-step loop did not terminate");
    }
    steps
}

fn settings() -> TimeSettings {
    TimeSettings {
        fixed_step: 1.0 / 60.0,
        max_steps_per_frame: 8,
        ..TimeSettings::default()
    }
}

// ============================================================================
// Fixed-step budget
// ============================================================================

#[test]
fn time_long_stall_is_clamped_to_max_steps() {
    let mut time = Time::new(settings());

    time.advance(0.5);
    assert!(approx_eq(time.accumulator(), 8.0 / 60.0));
    assert_eq!(drain(&mut time), 8);
    assert!(!time.try_consume_fixed_step());

    // Small frames after the stall accumulate normally
    time.advance(0.016);
    assert_eq!(drain(&mut time), 0);
    time.advance(0.016);
    assert_eq!(drain(&mut time), 1);
    assert!(approx_eq(time.accumulator(), 0.032 - 1.0 / 60.0));
}

#[test]
fn time_budget_never_exceeds_max_steps() {
    let mut time = Time::new(settings());
    for raw in [0.1, 0.2, 3.0, 0.05, 0.25] {
        time.advance(raw);
        assert!(time.accumulator() <= 8.0 / 60.0 + 1e-12);
        assert!(drain(&mut time) <= 8);
    }
}

#[test]
fn time_exact_steps_are_not_lost_to_rounding() {
    let mut time = Time::new(settings());
    let mut total = 0;
    for _ in 0..60 {
        time.advance(1.0 / 60.0);
        total += drain(&mut time);
    }
    assert_eq!(total, 60);
    assert!(approx_eq(time.fixed_elapsed(), 1.0));
}

#[test]
fn time_fixed_alpha_reports_leftover_fraction() {
    let mut time = Time::new(settings());
    time.advance(1.5 / 60.0);
    drain(&mut time);
    assert!((time.fixed_alpha() - 0.5).abs() < 1e-6);
}

// ============================================================================
// Variable delta
// ============================================================================

#[test]
fn time_delta_is_clamped_then_scaled() {
    let mut time = Time::new(TimeSettings {
        max_delta: 0.1,
        time_scale: 0.5,
        ..settings()
    });

    let scaled = time.advance(0.4);
    assert!(approx_eq(time.unscaled_delta(), 0.1));
    assert!(approx_eq(scaled, 0.05));
    assert!(approx_eq(time.delta(), 0.05));
    assert!(approx_eq(time.elapsed(), 0.05));
    assert_eq!(time.frame_count, 1);
}

#[test]
fn time_zero_scale_pauses_simulation() {
    let mut time = Time::new(settings());
    time.set_time_scale(0.0);
    time.advance(0.1);
    assert_eq!(time.delta(), 0.0);
    assert_eq!(drain(&mut time), 0);

    time.set_time_scale(-3.0);
    assert_eq!(time.time_scale(), 0.0);
}

#[test]
fn time_tick_samples_wall_clock() {
    let mut time = Time::new(settings());
    time.reset_baseline();
    let delta = time.tick();
    assert!(delta >= 0.0);
    assert!(delta <= 0.25);
    assert_eq!(time.frame_count, 1);
}
