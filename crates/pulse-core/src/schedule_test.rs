use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use super::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

fn table() -> DayTable {
    DayTable::new(default_timetable(), day(10), Duration::seconds(60))
}

fn index_of(table: &DayTable, name: &str) -> usize {
    table
        .entries()
        .iter()
        .position(|e| e.slot.name == name)
        .unwrap()
}

#[test]
fn parse_time_of_day_accepts_hh_mm() {
    assert_eq!(parse_time_of_day("09:00").unwrap(), hm(9, 0));
    assert_eq!(parse_time_of_day(" 21:30 ").unwrap(), hm(21, 30));
}

#[test]
fn parse_time_of_day_rejects_garbage() {
    assert!(matches!(
        parse_time_of_day("25:00"),
        Err(CoreError::InvalidTimeOfDay(_))
    ));
    assert!(parse_time_of_day("nine").is_err());
}

#[test]
fn slot_action_parses_and_maps_categories() {
    assert_eq!(
        "evening_message".parse::<SlotAction>().unwrap(),
        SlotAction::EveningMessage
    );
    assert_eq!(
        SlotAction::MiddayMessage.message_category(),
        Some(MessageCategory::Midday)
    );
    assert_eq!(SlotAction::TrendCheck.message_category(), None);
    assert_eq!(
        "no_post_reminder".parse::<SlotAction>().unwrap(),
        SlotAction::NoPostReminder
    );
    assert_eq!(SlotAction::WeeklyReport.message_category(), None);
    assert!("nap".parse::<SlotAction>().is_err());
}

#[test]
fn due_within_tolerance_on_either_side() {
    let t = table();
    let morning = index_of(&t, "morning");
    assert_eq!(t.due(hms(8, 59, 0)), vec![morning]);
    assert_eq!(t.due(hms(9, 1, 0)), vec![morning]);
    assert!(t.due(hms(9, 1, 1)).is_empty());
    assert!(t.due(hms(8, 58, 59)).is_empty());
}

#[test]
fn due_returns_definition_order_for_shared_minute() {
    let slots = vec![
        ScheduleSlot::new("b", hm(9, 0), SlotAction::TrendCheck),
        ScheduleSlot::new("a", hm(9, 0), SlotAction::MorningMessage),
    ];
    let t = DayTable::new(slots, day(10), Duration::seconds(60));
    assert_eq!(t.due(hm(9, 0)), vec![0, 1]);
}

#[test]
fn due_does_not_wrap_midnight() {
    let slots = vec![ScheduleSlot::new("late", hms(23, 59, 30), SlotAction::Feedback)];
    let t = DayTable::new(slots, day(10), Duration::seconds(60));
    assert!(t.due(hms(0, 0, 10)).is_empty());
    assert_eq!(t.due(hms(23, 59, 59)), vec![0]);
}

#[test]
fn fired_slot_is_no_longer_due() {
    let mut t = table();
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 7, 0, 0).unwrap();
    let morning = index_of(&t, "morning");

    assert!(t.mark_fired(morning, now));
    assert!(t.due(hm(9, 0)).is_empty());
    assert!(!t.mark_fired(morning, now), "second fire must be refused");
    assert_eq!(t.status_of("morning"), Some(SlotStatus::Fired));
    assert_eq!(t.entries()[morning].last_fired, Some(now));
}

#[test]
fn failure_keeps_slot_pending() {
    let mut t = table();
    let morning = index_of(&t, "morning");

    assert_eq!(t.record_failure(morning), 1);
    assert_eq!(t.record_failure(morning), 2);
    assert_eq!(t.status_of("morning"), Some(SlotStatus::Pending));
    assert_eq!(t.due(hm(9, 0)), vec![morning]);
}

#[test]
fn slot_without_tick_ends_missed_at_rollover() {
    let mut t = table();
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 7, 0, 0).unwrap();
    t.mark_fired_by_name("full-scan", now);

    let rollover = t.roll_over(day(11)).expect("later day rolls over");

    assert_eq!(rollover.previous_day, day(10));
    let missed: Vec<&str> = rollover.missed.iter().map(|s| s.name.as_str()).collect();
    assert!(missed.contains(&"morning"));
    assert!(!missed.contains(&"full-scan"));
    let scheduled = default_timetable()
        .iter()
        .filter(|s| s.runs_on(day(10)))
        .count();
    assert_eq!(missed.len(), scheduled - 1);
    assert!(!missed.contains(&"weekly-report"), "not scheduled on a Tuesday");

    assert_eq!(t.day(), day(11));
    assert!(t
        .entries()
        .iter()
        .all(|e| e.status == SlotStatus::Pending && e.attempts == 0 && e.last_fired.is_none()));
}

#[test]
fn roll_over_to_same_or_earlier_day_is_ignored() {
    let mut t = table();
    let morning = index_of(&t, "morning");
    t.mark_fired(morning, Utc::now());

    assert!(t.roll_over(day(10)).is_none());
    assert!(t.roll_over(day(9)).is_none());
    assert_eq!(t.status_of("morning"), Some(SlotStatus::Fired));
}

#[test]
fn mark_fired_by_unknown_name_is_false() {
    let mut t = table();
    assert!(!t.mark_fired_by_name("brunch", Utc::now()));
    assert_eq!(t.status_of("brunch"), None);
}

#[test]
fn weekday_slot_is_due_only_on_its_day() {
    let slots = vec![ScheduleSlot::new("report", hm(18, 0), SlotAction::WeeklyReport).on(Weekday::Fri)];
    // 2026-03-10 is a Tuesday, 2026-03-13 a Friday.
    let tuesday = DayTable::new(slots.clone(), day(10), Duration::seconds(60));
    assert!(tuesday.due(hm(18, 0)).is_empty());

    let friday = DayTable::new(slots, day(13), Duration::seconds(60));
    assert_eq!(friday.due(hm(18, 0)), vec![0]);
}

#[test]
fn weekday_slot_is_missed_only_on_its_day() {
    let slots = vec![ScheduleSlot::new("report", hm(18, 0), SlotAction::WeeklyReport).on(Weekday::Fri)];
    let mut t = DayTable::new(slots, day(12), Duration::seconds(60));

    let thursday = t.roll_over(day(13)).unwrap();
    assert!(thursday.missed.is_empty());

    let friday = t.roll_over(day(14)).unwrap();
    assert_eq!(friday.previous_day, day(13));
    assert_eq!(friday.missed.len(), 1);
}
