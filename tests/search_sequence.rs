//! Search script runs against the scripted rig

use rekha::config::{AppConfig, SamplingProfile};
use rekha::error::Result;
use rekha::hardware::mock::{MockRig, RigScript};
use rekha::hardware::{Cue, ImmediateStart, StartTrigger};
use rekha::{GridPoint, Heading, MotionController, SearchOutcome, SearchSequencer};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn fast_config() -> AppConfig {
    let fast = |samples, warmup_ms| SamplingProfile {
        samples,
        interval_ms: 1,
        warmup_ms,
    };
    let mut config = AppConfig::default();
    config.sensor.threshold = 50.0;
    config.sensor.advance = fast(2, 20);
    config.sensor.probe = fast(2, 20);
    config.sensor.correction = fast(2, 0);
    config.motion.max_travel_times_ms = [300, 300];
    config.motion.poll_interval_ms = 2;
    config.motion.correction_timeout_ms = 500;
    config.motion.sweep_arc_deg = 0.0;
    config
}

/// Two short columns starting on the first tower slot
fn small_plan() -> AppConfig {
    let mut config = fast_config();
    config.search.start_position = [10.0, 3.0];
    config.search.start_heading = [0, 1];
    config.search.approach = Vec::new();
    config.search.columns = 2;
    config.search.cells_per_column = 2;
    config
}

fn sequencer(config: &AppConfig, rig: &MockRig, trigger: Box<dyn StartTrigger>) -> SearchSequencer {
    let controller = MotionController::new(config, rig.light(), rig.peripherals()).unwrap();
    SearchSequencer::new(controller, trigger, config.search.clone())
}

struct CountingTrigger(Arc<AtomicUsize>);

impl StartTrigger for CountingTrigger {
    fn wait_for_start(&mut self) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn empty_columns_end_with_not_found() {
    let config = small_plan();
    let rig = MockRig::new(RigScript::default());
    let starts = Arc::new(AtomicUsize::new(0));
    let mut sequencer = sequencer(
        &config,
        &rig,
        Box::new(CountingTrigger(Arc::clone(&starts))),
    );

    let outcome = sequencer.run().unwrap();

    assert_eq!(outcome, SearchOutcome::NotFound);
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    // Up column 0, across two tiles, down column 1; each turn creeps
    // forward once to find the marker edge again
    let controller = sequencer.controller();
    assert_eq!(controller.position(), GridPoint::new(12, 3));
    assert_eq!(controller.heading(), Heading::NegY);
    assert_eq!(rig.forward_runs(), 8);
    assert_eq!(controller.stats().tiles_reached, 6);
    assert_eq!(
        rig.announcements().last(),
        Some(&("not found".to_string(), Cue::Speak("Not found".to_string())))
    );
}

#[test]
fn touch_in_second_column_reports_object_number() {
    let config = small_plan();
    // probe, probe, turn, advance, advance, turn, probe (touch)
    let rig = MockRig::new(RigScript {
        touch_segments: VecDeque::from(vec![false, false, false, false, false, false, true]),
        ..RigScript::default()
    });
    let mut sequencer = sequencer(&config, &rig, Box::new(ImmediateStart));

    let outcome = sequencer.run().unwrap();

    let position = GridPoint::from_f64(12.0, 4.5).unwrap();
    assert_eq!(
        outcome,
        SearchOutcome::Found {
            object_number: 5,
            position
        }
    );
    assert_eq!(sequencer.controller().position(), position);
    assert_eq!(
        rig.announcements().last(),
        Some(&("5".to_string(), Cue::Speak("Object 5".to_string())))
    );
}

#[test]
fn first_probe_contact_is_object_one() {
    let config = small_plan();
    let rig = MockRig::new(RigScript {
        touch_segments: VecDeque::from(vec![true]),
        ..RigScript::default()
    });
    let mut sequencer = sequencer(&config, &rig, Box::new(ImmediateStart));

    match sequencer.run().unwrap() {
        SearchOutcome::Found { object_number, .. } => assert_eq!(object_number, 1),
        SearchOutcome::NotFound => panic!("tower in the first cell was missed"),
    }
    assert_eq!(rig.forward_runs(), 1);
}

#[test]
fn default_plan_approaches_and_sweeps_three_columns() {
    let config = fast_config();
    let rig = MockRig::new(RigScript::default());
    let mut sequencer = sequencer(&config, &rig, Box::new(ImmediateStart));

    let outcome = sequencer.run().unwrap();

    assert_eq!(outcome, SearchOutcome::NotFound);
    let controller = sequencer.into_controller();
    // 13 approach tiles, 9 probes, 2 x 2 column changes, one creep per turn
    assert_eq!(rig.forward_runs(), 26 + 6);
    assert_eq!(controller.position(), GridPoint::new(14, 6));
    assert_eq!(controller.heading(), Heading::PosY);
    assert_eq!(controller.stats().recoveries, 0);
}
