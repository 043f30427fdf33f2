//! Tests for rate bands and extension hooks
//!
//! Tests band cadence over the base tick, hook binding and dispatch, and the
//! core task table.
//!
//! Run with: cargo test --no-default-features --features std --test scheduler_tests

use courier_firmware::scheduler::{ExtensionHooks, RateBand, TaskId, TASK_TABLE};

/// Counters the hooks write into
#[derive(Default)]
struct Counters {
    init: u32,
    fast: u32,
    medium: u32,
}

fn on_init(counters: &mut Counters) {
    counters.init += 1;
}

fn on_fast(counters: &mut Counters) {
    counters.fast += 1;
}

fn on_medium(counters: &mut Counters) {
    counters.medium += 1;
}

const HOOKS: ExtensionHooks<Counters> = ExtensionHooks::new()
    .with_init(on_init)
    .with(RateBand::Fast, on_fast)
    .with(RateBand::Medium, on_medium);

// ============================================================================
// Rate Bands
// ============================================================================

#[test]
fn band_rates() {
    assert_eq!(RateBand::BASE_HZ, 100);
    let rates: Vec<u32> = RateBand::ALL.iter().map(|band| band.hz()).collect();
    assert_eq!(rates, vec![100, 50, 10, 1]);
}

#[test]
fn one_second_of_ticks() {
    for (band, expected) in [
        (RateBand::Fast, 100),
        (RateBand::FiftyHz, 50),
        (RateBand::Medium, 10),
        (RateBand::SuperSlow, 1),
    ] {
        let runs = (0..RateBand::BASE_HZ)
            .filter(|tick| band.is_due(*tick))
            .count();
        assert_eq!(runs, expected, "{band:?}");
    }
}

#[test]
fn tick_zero_runs_every_band() {
    for band in RateBand::ALL {
        assert!(band.is_due(0), "{band:?}");
    }
}

#[test]
fn fifty_hz_runs_every_other_tick() {
    let due: Vec<u32> = (0..8).filter(|tick| RateBand::FiftyHz.is_due(*tick)).collect();
    assert_eq!(due, vec![0, 2, 4, 6]);
    assert_eq!(RateBand::FiftyHz.period_ms(), 20);
}

#[test]
fn slowest_band_divides_by_all_others() {
    let slowest = RateBand::SuperSlow.divisor();
    for band in RateBand::ALL {
        assert_eq!(slowest % band.divisor(), 0, "{band:?}");
    }
}

// ============================================================================
// Task Table
// ============================================================================

#[test]
fn core_task_table() {
    assert_eq!(TASK_TABLE, [(TaskId::ManualOverride, RateBand::FiftyHz)]);
}

// ============================================================================
// Extension Hooks
// ============================================================================

#[test]
fn unbound_hooks_are_noops() {
    let hooks = ExtensionHooks::<Counters>::new();
    let mut counters = Counters::default();

    hooks.run_init(&mut counters);
    for band in RateBand::ALL {
        hooks.run(band, &mut counters);
        assert!(!hooks.is_bound(band));
    }

    assert_eq!(counters.init, 0);
    assert_eq!(counters.fast, 0);
    assert_eq!(counters.medium, 0);
    assert_eq!(hooks.bound_bands().count(), 0);
}

#[test]
fn bound_hooks_run() {
    let mut counters = Counters::default();

    HOOKS.run_init(&mut counters);
    HOOKS.run(RateBand::Fast, &mut counters);
    HOOKS.run(RateBand::Fast, &mut counters);
    HOOKS.run(RateBand::Medium, &mut counters);
    HOOKS.run(RateBand::SuperSlow, &mut counters);

    assert_eq!(counters.init, 1);
    assert_eq!(counters.fast, 2);
    assert_eq!(counters.medium, 1);
}

#[test]
fn bound_bands_fastest_first() {
    let bands: Vec<RateBand> = HOOKS.bound_bands().collect();
    assert_eq!(bands, vec![RateBand::Fast, RateBand::Medium]);
}

#[test]
fn dispatch_over_one_second() {
    let mut counters = Counters::default();

    for tick in 0..RateBand::BASE_HZ {
        for band in HOOKS.bound_bands() {
            if band.is_due(tick) {
                HOOKS.run(band, &mut counters);
            }
        }
    }

    assert_eq!(counters.fast, 100);
    assert_eq!(counters.medium, 10);
}

#[test]
fn rebinding_replaces_the_hook() {
    let hooks = ExtensionHooks::new()
        .with(RateBand::Medium, on_fast)
        .with(RateBand::Medium, on_medium);
    let mut counters = Counters::default();

    hooks.run(RateBand::Medium, &mut counters);

    assert_eq!(counters.fast, 0);
    assert_eq!(counters.medium, 1);
}
