//! End-to-end race scenarios
//!
//! Drives complete sessions through the public API: fixes go in through the
//! live channel or a replay script and race events come out of the
//! connection streams.

use anyhow::{Context, Result, ensure};
use futures::StreamExt;
use lapgate::{
    EngineConfig, Fix, GeoPoint, Lapgate, LineKind, MessageSender, RaceConnection, RaceEvent, RacePhase,
    ReferenceLine, ReplayProvider, Timestamp,
};
use std::path::PathBuf;
use std::time::Duration;

/// Latitude offset either side of a gate, about 5.5 m.
const D: f64 = 0.00005;

fn test_data(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data").join(relative)
}

fn start_line() -> ReferenceLine {
    ReferenceLine::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0002, 0.0))
}

fn lap_line() -> ReferenceLine {
    ReferenceLine::new(GeoPoint::new(0.001, 0.0), GeoPoint::new(0.0012, 0.0))
}

fn fix(secs: f64, lon: f64, lat: f64) -> Fix {
    Fix::new(GeoPoint::new(lon, lat), Timestamp::from_secs_f64(secs))
}

/// South to north through the middle of `line`, arriving at `secs`.
fn crossing(line: ReferenceLine, secs: f64) -> [Fix; 2] {
    let lon = line.midpoint().lon;
    [fix(secs - 0.1, lon, -D), fix(secs, lon, D)]
}

/// From the start gate towards the lap gate, passing the equator between them.
fn between_gates(secs: f64) -> [Fix; 2] {
    [fix(secs + 4.0, 0.0004, D), fix(secs + 7.0, 0.0008, -D)]
}

/// Loop east of every gate and come back south of `line`, leaving the last
/// crossing at `secs` and arriving just before `until`.
fn loop_back(line: ReferenceLine, secs: f64, until: f64) -> Vec<Fix> {
    let step = (until - 0.1 - secs) / 4.0;
    vec![
        fix(secs + step, 0.003, D),
        fix(secs + step * 2.0, 0.003, -D),
        fix(secs + step * 3.0, line.midpoint().lon + 0.0005, -D),
    ]
}

async fn feed(sender: &MessageSender, fixes: impl IntoIterator<Item = Fix>) -> Result<()> {
    for fix in fixes {
        sender.send_fix(fix).await?;
    }
    Ok(())
}

async fn all_events(connection: &RaceConnection) -> Result<Vec<RaceEvent>> {
    tokio::time::timeout(Duration::from_secs(5), connection.events().collect::<Vec<_>>())
        .await
        .context("event stream did not end")
}

#[tokio::test]
async fn no_lines_means_no_events() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let (connection, sender) = Lapgate::channel(&EngineConfig::default().with_total_laps(3)).await?;

    let mut fixes = crossing(start_line(), 10.0).to_vec();
    fixes.extend(crossing(lap_line(), 20.0));
    feed(&sender, fixes).await?;
    drop(sender);

    ensure!(all_events(&connection).await?.is_empty(), "events emitted without lines");
    assert_eq!(connection.current_race().phase, RacePhase::WaitingForStart);
    Ok(())
}

#[tokio::test]
async fn double_start_crossing_starts_once() -> Result<()> {
    let unit = ReferenceLine::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
    let config = EngineConfig::default().with_total_laps(3).with_line(LineKind::Start, unit);
    let (connection, sender) = Lapgate::channel(&config).await?;

    feed(
        &sender,
        [fix(10.0, 0.5, -D), fix(10.05, 0.5, D), fix(10.1, 0.5, -D), fix(10.15, 0.5, D)],
    )
    .await?;
    drop(sender);

    let events = all_events(&connection).await?;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], RaceEvent::RaceStarted { total_laps: 3, .. }));
    Ok(())
}

#[tokio::test]
async fn shared_lap_and_finish_line_finishes_once() -> Result<()> {
    let config = EngineConfig::default()
        .with_total_laps(2)
        .with_line(LineKind::Start, start_line())
        .with_line(LineKind::Lap, lap_line())
        .with_line(LineKind::Finish, lap_line());
    let (connection, sender) = Lapgate::channel(&config).await?;

    feed(&sender, crossing(start_line(), 1000.0)).await?;
    feed(&sender, between_gates(1000.0)).await?;
    feed(&sender, crossing(lap_line(), 1010.0)).await?;
    feed(&sender, loop_back(lap_line(), 1010.0, 1022.0)).await?;
    feed(&sender, crossing(lap_line(), 1022.0)).await?;
    drop(sender);

    let events = all_events(&connection).await?;
    let names: Vec<_> = events.iter().map(RaceEvent::name).collect();
    assert_eq!(names, vec!["race_started", "lap_completed", "lap_completed", "race_finished"]);

    match (&events[1], &events[2], &events[3]) {
        (
            RaceEvent::LapCompleted { lap_number: 1, lap_duration: first, race_finished: false, .. },
            RaceEvent::LapCompleted { lap_number: 2, lap_duration: second, race_finished: true, .. },
            RaceEvent::RaceFinished { final_lap_number: 2, final_lap_duration, .. },
        ) => {
            assert_eq!(*first, Duration::from_secs(10));
            assert_eq!(*second, Duration::from_secs(12));
            assert_eq!(final_lap_duration, second);
        }
        other => panic!("unexpected events {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn gap_longer_than_threshold_hides_the_crossing() -> Result<()> {
    let config = EngineConfig::default()
        .with_total_laps(2)
        .with_line(LineKind::Start, start_line())
        .with_line(LineKind::Lap, lap_line());
    let (connection, sender) = Lapgate::channel(&config).await?;

    let lon = lap_line().midpoint().lon;
    feed(&sender, crossing(start_line(), 1000.0)).await?;
    feed(&sender, [fix(1004.0, 0.0006, D), fix(1008.0, lon, -D)]).await?;
    // Six seconds of silence while the car crosses the lap line
    feed(&sender, [fix(1014.0, lon, D), fix(1014.5, lon, 2.0 * D)]).await?;
    drop(sender);

    let last = connection.finished().await;
    assert_eq!(last.phase, RacePhase::InLap(1));
    assert_eq!(last.laps_completed, 0);
    Ok(())
}

#[tokio::test]
async fn track_config_fixture_times_a_sprint() -> Result<()> {
    let config = EngineConfig::from_yaml_file(test_data("config/track.yaml"))?;
    let (connection, sender) = Lapgate::channel(&config).await?;
    let finish = ReferenceLine::new(GeoPoint::new(0.0015, 0.0), GeoPoint::new(0.0017, 0.0));

    feed(&sender, crossing(start_line(), 100.0)).await?;
    feed(&sender, between_gates(100.0)).await?;
    feed(&sender, crossing(lap_line(), 110.0)).await?;
    feed(&sender, loop_back(finish, 110.0, 122.5)).await?;
    feed(&sender, crossing(finish, 122.5)).await?;
    drop(sender);

    let last = connection.finished().await;
    assert_eq!(last.phase, RacePhase::Finished);
    assert_eq!(last.last_lap_time_sec, Some(12.5));
    assert_eq!(last.best_lap_time_sec, Some(10.0));
    Ok(())
}

#[tokio::test]
async fn replayed_sprint_matches_recorded_laps() -> Result<()> {
    let path = test_data("replay/two_lap_sprint.yaml");
    let provider = ReplayProvider::new(&path)?.unpaced();
    let connection = RaceConnection::from_provider(provider, &EngineConfig::default()).await?;

    let events = all_events(&connection).await?;
    let payloads: Vec<_> = events.iter().map(RaceEvent::to_payload).collect();
    let yaml = serde_yaml_ng::to_string(&payloads)?;

    assert!(yaml.contains("event: race_started"));
    assert!(yaml.contains("lap_time_seconds: 31.5"));
    assert!(yaml.contains("lap_time_seconds: 30.75"));
    assert!(yaml.contains("race_finished_flag: true"));
    assert_eq!(connection.finished().await.laps_completed, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn open_replays_at_recorded_pace() -> Result<()> {
    let connection = Lapgate::open(test_data("replay/gps_dropout.yaml"), &EngineConfig::default()).await?;
    let mut updates = connection.race_updates();

    let mut phases = Vec::new();
    while let Some(snapshot) = updates.next().await {
        if phases.last() != Some(&snapshot.phase) {
            phases.push(snapshot.phase);
        }
    }

    assert_eq!(phases, vec![RacePhase::WaitingForStart, RacePhase::InLap(1), RacePhase::Finished]);
    Ok(())
}
