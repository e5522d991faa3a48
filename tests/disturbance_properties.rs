use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::Vector3;
use posnoise::{
    Disturbance, DisturbanceOffsetController, DisturbanceParams, DisturbanceRegistry,
    FrequencySpacing, GeneratorParams, Interval, Pose, SignalGenerator, WaveBank, WaveRanges,
};

const DT: f64 = 0.02;

fn fixed_params(seed: u64) -> DisturbanceParams {
    DisturbanceParams {
        seed: Some(seed),
        pause_on_ground: false,
        ..DisturbanceParams::default()
    }
}

#[test]
fn identical_configuration_reproduces_identical_banks() {
    for spacing in [FrequencySpacing::Even, FrequencySpacing::Random] {
        for (seed, count) in [(0_u64, 1_usize), (7, 13), (2023, 100), (u64::MAX, 250)] {
            let ranges = WaveRanges {
                frequency: Interval::new(0.5, 4.0),
                ..WaveRanges::default()
            };
            let a = WaveBank::new(count, seed, ranges, spacing);
            let b = WaveBank::new(count, seed, ranges, spacing);
            assert_eq!(a.frequencies(), b.frequencies());
            assert_eq!(a.amplitudes(), b.amplitudes());
            assert_eq!(a.phases(), b.phases());
            assert_eq!(a.norm_factor(), b.norm_factor());
        }
    }
}

#[test]
fn normalized_output_stays_within_gain_bounds() {
    for gain in [0.5, 1.0, 2.5] {
        let params = GeneratorParams {
            wave_count: 60,
            spacing: FrequencySpacing::Random,
            gain,
            ..GeneratorParams::default()
        };
        let generator = SignalGenerator::from_params(&params, 31);
        let bound = gain.abs();
        for v in generator.evaluate_batch((0..5_000).map(|k| k as f64 * 0.0071 - 10.0), true) {
            assert!(v.abs() <= bound, "{v} exceeds {bound}");
        }
    }
}

#[test]
fn deterministic_spacing_example() {
    let ranges = WaveRanges {
        frequency: Interval::new(1.0, 9.0),
        ..WaveRanges::default()
    };
    let bank = WaveBank::new(5, 1, ranges, FrequencySpacing::Even);
    assert_eq!(bank.frequencies(), &[1.0, 3.0, 5.0, 7.0, 9.0]);

    let single = WaveBank::new(1, 1, ranges, FrequencySpacing::Even);
    assert_eq!(single.frequencies(), &[1.0]);
}

#[test]
fn controllers_with_same_seed_produce_same_trajectory() {
    let leader = Pose::at(Vector3::new(0.0, 1.0, 0.0));
    let mut a = DisturbanceOffsetController::new(fixed_params(99), Some(leader)).unwrap();
    let mut b = DisturbanceOffsetController::new(fixed_params(99), Some(leader)).unwrap();
    a.activate();
    b.activate();

    for _ in 0..200 {
        a.tick(DT);
        b.tick(DT);
        assert_eq!(a.offset(), b.offset());
    }
}

#[test]
fn shared_walking_leader_freezes_noise_during_stance() {
    let leader = Rc::new(RefCell::new(Pose::at(Vector3::new(0.0, 0.5, 0.0))));
    let params = DisturbanceParams {
        seed: Some(5),
        pause_on_ground: true,
        calibration_duration: 0.0,
        ..DisturbanceParams::default()
    };
    let mut controller = DisturbanceOffsetController::new(params, Some(Rc::clone(&leader))).unwrap();
    controller.activate();

    for _ in 0..10 {
        controller.tick(0.25);
    }
    assert_eq!(controller.elapsed(), 2.5);

    leader.borrow_mut().position.y = 0.0;
    let frozen_offset = {
        controller.tick(0.25);
        controller.offset()
    };
    for _ in 0..10 {
        controller.tick(0.25);
        assert_eq!(controller.offset(), frozen_offset);
    }
    assert_eq!(controller.elapsed(), 2.5);

    leader.borrow_mut().position.y = 0.5;
    controller.tick(0.25);
    assert_eq!(controller.elapsed(), 2.75);
}

#[test]
fn registry_owned_controller_zeroes_on_deactivate() {
    let mut registry = DisturbanceRegistry::new();
    let leader = Pose::at(Vector3::new(0.3, 1.2, -0.4));
    let id = registry.register(Box::new(
        DisturbanceOffsetController::new(fixed_params(17), Some(leader)).unwrap(),
    ));

    registry.activate_all();
    for _ in 0..25 {
        registry.tick_all(DT);
    }
    assert_ne!(registry.get(id).unwrap().offset(), Vector3::zeros());

    registry.deactivate_all();
    let disturbance: &dyn Disturbance = registry.get(id).unwrap();
    assert_eq!(disturbance.offset(), Vector3::zeros());
    assert!(!disturbance.is_active());
}
