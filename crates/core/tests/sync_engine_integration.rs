//! End-to-end tests of the sync engine against in-memory ports

mod support;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use support::{MockCalendarStore, MockFileStore};
use trailsync_core::SyncRunner;
use trailsync_domain::TrailSyncError;

const NS: &str = "http://earth.google.com/kml/2.2";

fn track_kml(start: &str, end: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="{NS}">
  <Document>
    <Placemark>
      <styleUrl>#start</styleUrl>
      <TimeStamp><when>{start}</when></TimeStamp>
      <Point><coordinates>-123.1,49.2,10</coordinates></Point>
    </Placemark>
    <Placemark>
      <styleUrl>#end</styleUrl>
      <TimeStamp><when>{end}</when></TimeStamp>
      <Point><coordinates>-123.2,49.3,12</coordinates></Point>
      <description>Nice run</description>
    </Placemark>
  </Document>
</kml>"#
    )
}

fn morning_run_kml() -> String {
    track_kml("2014-01-01T08:00:00.000000Z", "2014-01-01T09:00:00.000000Z")
}

fn runner(files: &Arc<MockFileStore>, calendar: &Arc<MockCalendarStore>) -> SyncRunner {
    SyncRunner::new(
        files.clone(),
        calendar.clone(),
        "My Tracks".to_string(),
        "Logging".to_string(),
    )
}

#[tokio::test]
async fn aborts_when_no_root_folder_matches() {
    let files = Arc::new(MockFileStore::new().with_file("f1", "Run.kml", &morning_run_kml()));
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Logging"));

    let result = runner(&files, &calendar).run().await;

    match result {
        Err(TrailSyncError::Config(msg)) => assert!(msg.contains("no folder"), "got: {msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
    assert!(files.downloads().is_empty(), "no file may be processed");
    assert!(calendar.inserted().is_empty(), "no event may be written");
}

#[tokio::test]
async fn aborts_when_multiple_root_folders_match() {
    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_root_folder("folder-b", "My Tracks")
            .with_file("f1", "Run.kml", &morning_run_kml()),
    );
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Logging"));

    let result = runner(&files, &calendar).run().await;

    match result {
        Err(TrailSyncError::Config(msg)) => assert!(msg.contains("2 folders"), "got: {msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
    assert!(files.downloads().is_empty());
    assert!(calendar.inserted().is_empty());
}

#[tokio::test]
async fn nested_folders_with_the_same_name_are_ignored() {
    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_nested_folder("folder-b", "My Tracks", "folder-a")
            .with_file("f1", "Morning Run.kml", &morning_run_kml()),
    );
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Logging"));

    let summary = runner(&files, &calendar).run().await.expect("summary");

    assert_eq!(summary.folder, "My Tracks");
    assert_eq!(summary.total_parsed, 1);
    assert_eq!(summary.total_added, 1);
}

#[tokio::test]
async fn first_run_adds_second_run_is_idempotent() {
    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_file("f1", "Morning Run.kml", &morning_run_kml()),
    );
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Logging"));

    let summary = runner(&files, &calendar).run().await.expect("first run");
    assert_eq!(summary.total_parsed, 1);
    assert_eq!(summary.total_added, 1);
    assert_eq!(summary.total_failed, 0);
    assert_eq!(summary.calendar, "Logging");

    let inserted = calendar.inserted();
    assert_eq!(inserted.len(), 1);
    let (calendar_id, draft) = &inserted[0];
    assert_eq!(calendar_id, "cal-1");
    assert_eq!(draft.summary, "Morning Run");
    assert_eq!(draft.location, "49.2,-123.1");
    assert_eq!(draft.start, Utc.with_ymd_and_hms(2014, 1, 1, 8, 0, 0).unwrap());
    assert_eq!(draft.end, Utc.with_ymd_and_hms(2014, 1, 1, 9, 0, 0).unwrap());

    // Unchanged source folder: the second run parses the same file but
    // writes nothing.
    let summary = runner(&files, &calendar).run().await.expect("second run");
    assert_eq!(summary.total_parsed, 1);
    assert_eq!(summary.total_added, 0);
    assert_eq!(calendar.inserted().len(), 1);
}

#[tokio::test]
async fn creates_the_calendar_when_absent() {
    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_file("f1", "Morning Run.kml", &morning_run_kml()),
    );
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Personal"));

    let summary = runner(&files, &calendar).run().await.expect("summary");

    assert_eq!(calendar.created(), vec!["Logging".to_string()]);
    assert_eq!(summary.calendar, "Logging");
    assert_eq!(calendar.inserted().len(), 1);
    assert_eq!(calendar.inserted()[0].0, "cal-2");
}

#[tokio::test]
async fn failed_downloads_are_skipped() {
    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_failing_file("f1", "Broken.kml", 404)
            .with_file("f2", "Morning Run.kml", &morning_run_kml()),
    );
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Logging"));

    let summary = runner(&files, &calendar).run().await.expect("summary");

    assert_eq!(summary.total_parsed, 1);
    assert_eq!(summary.total_added, 1);
    assert_eq!(summary.total_failed, 0);
    assert_eq!(calendar.inserted()[0].1.summary, "Morning Run");
}

#[tokio::test]
async fn malformed_payloads_are_skipped() {
    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_file("f1", "Garbage.kml", "<kml>not really</kml>")
            .with_file("f2", "Morning Run.kml", &morning_run_kml()),
    );
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Logging"));

    let summary = runner(&files, &calendar).run().await.expect("summary");

    assert_eq!(summary.total_parsed, 1);
    assert_eq!(summary.total_failed, 1);
    assert_eq!(summary.total_added, 1);
    assert_eq!(calendar.inserted().len(), 1);
}

#[tokio::test]
async fn all_files_survive_pagination() {
    // Five files against a page size of two: pages of 2, 2 and 1
    let mut files = MockFileStore::new().with_root_folder("folder-a", "My Tracks");
    for i in 0..5 {
        let start = format!("2014-01-0{}T08:00:00.000000Z", i + 1);
        let end = format!("2014-01-0{}T09:00:00.000000Z", i + 1);
        files = files.with_file(
            &format!("f{i}"),
            &format!("Run {i}.kml"),
            &track_kml(&start, &end),
        );
    }
    let files = Arc::new(files);
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Logging"));

    let summary = runner(&files, &calendar).run().await.expect("summary");

    assert_eq!(summary.total_parsed, 5);
    assert_eq!(summary.total_added, 5);

    let titles: Vec<String> =
        calendar.inserted().iter().map(|(_, draft)| draft.summary.clone()).collect();
    assert_eq!(titles, vec!["Run 0", "Run 1", "Run 2", "Run 3", "Run 4"]);
}

#[tokio::test]
async fn events_inside_the_fuzz_window_are_duplicates() {
    let start = Utc.with_ymd_and_hms(2014, 1, 1, 8, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2014, 1, 1, 9, 0, 0).unwrap();

    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_file("f1", "Morning Run.kml", &morning_run_kml()),
    );
    // Existing event one second before the recording: within the window,
    // on the matching side.
    let calendar = Arc::new(
        MockCalendarStore::new().with_calendar("cal-1", "Logging").with_event(
            "cal-1",
            "Morning Run",
            start - Duration::seconds(1),
            end - Duration::seconds(1),
        ),
    );

    let summary = runner(&files, &calendar).run().await.expect("summary");

    assert_eq!(summary.total_parsed, 1);
    assert_eq!(summary.total_added, 0);
    assert!(calendar.inserted().is_empty());
}

#[tokio::test]
async fn events_after_the_recording_are_not_duplicates() {
    let start = Utc.with_ymd_and_hms(2014, 1, 1, 8, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2014, 1, 1, 9, 0, 0).unwrap();

    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_file("f1", "Morning Run.kml", &morning_run_kml()),
    );
    // Existing event one second after the recording: inside the window by
    // magnitude, but the signed comparison rejects it.
    let calendar = Arc::new(
        MockCalendarStore::new().with_calendar("cal-1", "Logging").with_event(
            "cal-1",
            "Morning Run",
            start + Duration::seconds(1),
            end + Duration::seconds(1),
        ),
    );

    let summary = runner(&files, &calendar).run().await.expect("summary");

    assert_eq!(summary.total_added, 1);
    assert_eq!(calendar.inserted().len(), 1);
}

#[tokio::test]
async fn identical_tracks_in_one_batch_both_insert() {
    // The cache is loaded once per run, so two identical recordings in
    // the same batch are not deduplicated against each other.
    let files = Arc::new(
        MockFileStore::new()
            .with_root_folder("folder-a", "My Tracks")
            .with_file("f1", "Morning Run.kml", &morning_run_kml())
            .with_file("f2", "Morning Run.kml", &morning_run_kml()),
    );
    let calendar = Arc::new(MockCalendarStore::new().with_calendar("cal-1", "Logging"));

    let summary = runner(&files, &calendar).run().await.expect("summary");

    assert_eq!(summary.total_parsed, 2);
    assert_eq!(summary.total_added, 2);
    assert_eq!(calendar.inserted().len(), 2);
}
