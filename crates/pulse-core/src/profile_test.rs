use std::path::Path;

use super::*;

const MINIMAL: &str = r#"
creator:
  name: "Noam"
  patterns: [couple_content, story_times]
"#;

#[test]
fn minimal_profile_uses_defaults() {
    let profile = parse_profile(MINIMAL).unwrap();

    assert_eq!(profile.creator.name, "Noam");
    assert_eq!(profile.creator.partner_name, None);
    assert_eq!(profile.creator.language, "en");
    assert_eq!(profile.timetable, default_timetable());
    assert_eq!(profile.posting, PostingWindow::default());
    assert_eq!(profile.posting.to_string(), "18:00-20:00");
    assert_eq!(profile.trends.max_items, 20);
    assert_eq!(profile.trends.max_entry_age_days, 3);
    assert!(profile.trends.feeds.is_empty());
}

#[test]
fn custom_timetable_keeps_definition_order() {
    let yaml = r#"
creator:
  name: "Noam"
  patterns: [music_content]
timetable:
  - name: evening
    time: "21:00"
    action: evening_message
  - name: scan
    time: "06:00"
    action: profile_scan
"#;
    let profile = parse_profile(yaml).unwrap();
    let names: Vec<&str> = profile.timetable.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["evening", "scan"]);
    assert_eq!(profile.timetable[1].action, SlotAction::ProfileScan);
}

#[test]
fn weekly_slot_parses_its_weekday() {
    let yaml = r#"
creator:
  name: "Noam"
  patterns: [music_content]
timetable:
  - name: weekly-report
    time: "18:00"
    action: weekly_report
    weekday: friday
  - name: no-post-check
    time: "11:00"
    action: no_post_reminder
"#;
    let profile = parse_profile(yaml).unwrap();
    assert_eq!(profile.timetable[0].weekday, Some(chrono::Weekday::Fri));
    assert_eq!(profile.timetable[1].weekday, None);
    assert_eq!(profile.timetable[1].action, SlotAction::NoPostReminder);
}

#[test]
fn unknown_weekday_is_rejected() {
    let yaml = r#"
creator:
  name: "Noam"
  patterns: [music_content]
timetable:
  - name: weekly-report
    time: "18:00"
    action: weekly_report
    weekday: someday
"#;
    let err = parse_profile(yaml).unwrap_err();
    assert!(err.to_string().contains("unknown weekday"), "got: {err}");
}

#[test]
fn duplicate_slot_names_are_rejected() {
    let yaml = r#"
creator:
  name: "Noam"
  patterns: [music_content]
timetable:
  - name: morning
    time: "09:00"
    action: morning_message
  - name: Morning
    time: "10:00"
    action: trend_check
"#;
    let err = parse_profile(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate slot name"), "got: {err}");
}

#[test]
fn unknown_action_is_a_parse_error() {
    let yaml = r#"
creator:
  name: "Noam"
  patterns: [music_content]
timetable:
  - name: nap
    time: "14:00"
    action: take_a_nap
"#;
    assert!(matches!(
        parse_profile(yaml),
        Err(ConfigError::ProfileFileParse(_))
    ));
}

#[test]
fn bad_slot_time_is_rejected() {
    let yaml = r#"
creator:
  name: "Noam"
  patterns: [music_content]
timetable:
  - name: morning
    time: "9am"
    action: morning_message
"#;
    let err = parse_profile(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("morning"));
}

#[test]
fn empty_patterns_are_rejected() {
    let yaml = r#"
creator:
  name: "Noam"
  patterns: ["  "]
"#;
    let err = parse_profile(yaml).unwrap_err();
    assert!(err.to_string().contains("content pattern"));
}

#[test]
fn inverted_posting_window_is_rejected() {
    let yaml = r#"
creator:
  name: "Noam"
  patterns: [music_content]
posting:
  start: "20:00"
  end: "18:00"
"#;
    let err = parse_profile(yaml).unwrap_err();
    assert!(err.to_string().contains("posting window"));
}

#[test]
fn missing_file_reports_path() {
    let err = load_profile(Path::new("/nonexistent/profile.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::ProfileFileIo { .. }));
    assert!(err.to_string().contains("/nonexistent/profile.yaml"));
}

#[test]
fn shipped_profile_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/profile.yaml");
    let profile = load_profile(&path).unwrap();
    assert_eq!(profile.creator.partner_name.as_deref(), Some("Maya"));
    assert_eq!(profile.timetable.len(), 10);
    let weekly = profile
        .timetable
        .iter()
        .find(|s| s.action == SlotAction::WeeklyReport)
        .unwrap();
    assert_eq!(weekly.weekday, Some(Weekday::Fri));
    assert_eq!(profile.trends.feeds.len(), 2);
}
