//! End-to-end autonomy: planner, follower and interpreter driving a
//! live session.

use ratha_nav::config::RathaConfig;
use ratha_nav::session::{NullSink, Session, TelemetrySink};
use ratha_nav::sequences::{parse_program, SequenceFormat};
use ratha_sim::telemetry::VehicleTelemetry;

fn session_from(toml_src: &str) -> Session {
    let config: RathaConfig = toml::from_str(toml_src).unwrap();
    let mut session = Session::from_config(&config);
    session.set_sink(Box::new(NullSink));
    session
}

#[test]
fn follower_drives_to_target() {
    let mut session = session_from(
        r#"
        [vehicle]
        start_x = 100.0
        start_y = 100.0

        [map]
        width = 800.0
        height = 600.0
        margin = 0.0
        cell_size = 40.0

        [map.target]
        x = 400.0
        y = 80.0
        size = 40.0
        "#,
    );

    // Straight run along the row of the spawn cell.
    assert!(session.follow_path_to((10, 2)));
    assert!(session.autopilot_active());

    let mut reached = false;
    for _ in 0..5000 {
        session.tick();
        assert!(!session.vehicle().crashed());
        if session.goal_reached() {
            reached = true;
            break;
        }
    }
    assert!(reached, "vehicle should reach the target marker");
    assert!(session.vehicle().position().x > 350.0);
}

#[test]
fn follower_completion_clears_autopilot() {
    let mut session = session_from(
        r#"
        [vehicle]
        start_x = 100.0
        start_y = 100.0

        [map]
        margin = 0.0
        cell_size = 40.0
        "#,
    );

    assert!(session.follow_path_to((6, 2)));
    for _ in 0..5000 {
        session.tick();
        if !session.autopilot_active() {
            break;
        }
    }
    assert!(!session.autopilot_active(), "follow must terminate");
    // Final waypoint center is (260, 100); arrival is within half a cell.
    let pos = session.vehicle().position();
    assert!((pos.x - 260.0).abs() < 40.0);
    assert!((pos.y - 100.0).abs() < 40.0);
}

#[test]
fn sequence_program_drives_vehicle() {
    let mut session = session_from(
        r#"
        [simulation]
        tick_hz = 20

        [vehicle]
        start_x = 100.0
        start_y = 100.0

        [map]
        margin = 0.0
        "#,
    );

    let steps = parse_program("forward,1\nstop,0\n", SequenceFormat::Csv).unwrap();
    session.add_sequence("dash.csv", steps);
    session.run_sequence("dash.csv");
    assert!(session.autopilot_active());

    for _ in 0..500 {
        session.tick();
        if !session.autopilot_active() {
            break;
        }
    }
    assert!(!session.autopilot_active(), "program must terminate");
    assert!(
        session.vehicle().position().x > 100.0,
        "the forward burst should have moved the vehicle"
    );
}

#[test]
fn sequence_conditional_reads_live_sensors() {
    // A wall close ahead: the conditional must take the then-branch
    // and back the vehicle away.
    let mut session = session_from(
        r#"
        [simulation]
        tick_hz = 20

        [vehicle]
        start_x = 300.0
        start_y = 300.0

        [map]
        width = 800.0
        height = 600.0
        margin = 0.0

        [[map.obstacles]]
        kind = "rect"
        x = 340.0
        y = 280.0
        size = 40.0
        "#,
    );

    let text = "if front < 30 then backward 1 else forward 1";
    let steps = parse_program(text, SequenceFormat::Csv).unwrap();
    session.add_sequence("react.csv", steps);
    session.run_sequence("react.csv");

    for _ in 0..500 {
        session.tick();
        if !session.autopilot_active() {
            break;
        }
    }
    assert!(
        session.vehicle().position().x < 300.0,
        "vehicle should have backed away from the wall"
    );
}

#[test]
fn telemetry_sink_failure_never_stalls_the_tick() {
    struct FailingSink;
    impl TelemetrySink for FailingSink {
        fn send(&mut self, _telemetry: &VehicleTelemetry) -> std::io::Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "receiver gone",
            ))
        }
    }

    let mut session = session_from(
        r#"
        [map]
        margin = 0.0
        "#,
    );
    session.set_sink(Box::new(FailingSink));
    session.command(ratha_sim::vehicle::DriveCommand::Forward);
    for _ in 0..10 {
        session.tick();
    }
    assert_eq!(session.ticks_elapsed(), 10);
}
