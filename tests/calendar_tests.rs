use chrono::{Datelike, Duration, NaiveDate, Weekday};
use gantt_schedule::{BusinessCalendar, CalendarSource, DayKind, HolidayRecord, HolidayTable};
use std::io::Write;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn company_holiday_table() -> HolidayTable {
    HolidayTable::from_records([HolidayRecord {
        date: d(2025, 8, 21),
        name: "Company holiday".into(),
    }])
}

#[test]
fn weekends_are_not_business_days() {
    let calendar = BusinessCalendar::weekends_only();
    assert!(calendar.is_weekend(d(2025, 8, 23)));
    assert!(calendar.is_weekend(d(2025, 8, 24)));
    assert!(!calendar.is_business_day(d(2025, 8, 23)));
    assert!(calendar.is_business_day(d(2025, 8, 22)));
    assert!(!calendar.has_holidays());
}

#[test]
fn holidays_are_classified_before_weekends() {
    let mut table = company_holiday_table();
    table.insert(d(2025, 8, 23), "Saturday festival");
    let calendar = BusinessCalendar::new(&table);

    assert_eq!(calendar.classify(d(2025, 8, 21)), DayKind::Holiday);
    assert_eq!(calendar.classify(d(2025, 8, 23)), DayKind::Holiday);
    assert_eq!(calendar.classify(d(2025, 8, 24)), DayKind::Weekend);
    assert_eq!(calendar.classify(d(2025, 8, 22)), DayKind::Business);
    assert_eq!(calendar.holiday_name(d(2025, 8, 21)), Some("Company holiday"));
    assert_eq!(calendar.holiday_name(d(2025, 8, 22)), None);
}

#[test]
fn counts_business_days_inclusive() {
    let weekends = BusinessCalendar::weekends_only();
    assert_eq!(weekends.count_business_days(d(2025, 8, 20), d(2025, 8, 25)), 4);

    let table = company_holiday_table();
    let calendar = BusinessCalendar::new(&table);
    assert_eq!(calendar.count_business_days(d(2025, 8, 20), d(2025, 8, 25)), 3);
    assert_eq!(calendar.count_business_days(d(2025, 8, 25), d(2025, 8, 20)), 0);
    assert_eq!(calendar.count_business_days(d(2025, 8, 23), d(2025, 8, 24)), 0);
    assert_eq!(calendar.count_business_days(d(2025, 8, 22), d(2025, 8, 22)), 1);
}

#[test]
fn count_matches_day_by_day_oracle() {
    let mut table = company_holiday_table();
    table.insert(d(2025, 9, 15), "Respect for the Aged Day");
    table.insert(d(2025, 9, 23), "Autumnal Equinox Day");
    let calendar = BusinessCalendar::new(&table);

    let origin = d(2025, 8, 1);
    for offset in 0..40 {
        let start = origin + Duration::days(offset);
        for span in 0..30 {
            let end = start + Duration::days(span);
            let expected = (0..=span)
                .map(|i| start + Duration::days(i))
                .filter(|day| {
                    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) && !table.contains(*day)
                })
                .count() as i64;
            assert_eq!(
                calendar.count_business_days(start, end),
                expected,
                "{start} .. {end}"
            );
        }
    }
}

#[test]
fn add_and_subtract_skip_non_business_days() {
    let table = company_holiday_table();
    let calendar = BusinessCalendar::new(&table);

    // Wed 20th + 2 business days skips the holiday and the weekend.
    assert_eq!(calendar.add_business_days(d(2025, 8, 20), 2), d(2025, 8, 25));
    assert_eq!(calendar.subtract_business_days(d(2025, 8, 25), 2), d(2025, 8, 20));
    assert_eq!(calendar.add_business_days(d(2025, 8, 20), 0), d(2025, 8, 20));
    assert_eq!(calendar.add_business_days(d(2025, 8, 20), -3), d(2025, 8, 20));
}

#[test]
fn adding_duration_minus_one_spans_exactly_duration_days() {
    let table = company_holiday_table();
    let calendar = BusinessCalendar::new(&table);
    let start = d(2025, 8, 18);
    for duration in 1..=30 {
        let end = calendar.add_business_days(start, duration - 1);
        assert_eq!(calendar.count_business_days(start, end), duration);
    }
}

#[test]
fn business_days_in_range_lists_only_working_days() {
    let table = company_holiday_table();
    let calendar = BusinessCalendar::new(&table);
    let days = calendar.business_days_in_range(d(2025, 8, 20), d(2025, 8, 25));
    assert_eq!(days, vec![d(2025, 8, 20), d(2025, 8, 22), d(2025, 8, 25)]);
}

#[test]
fn holiday_table_parses_data_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"holidays": [{{"date": "2025-09-23", "name": "Autumnal Equinox Day"}}, {{"date": "2025-09-15", "name": "Respect for the Aged Day"}}]}}"#
    )
    .unwrap();

    let table = HolidayTable::from_path(file.path()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.name(d(2025, 9, 15)), Some("Respect for the Aged Day"));
    let records = table.records();
    assert_eq!(records[0].date, d(2025, 9, 15));
    assert_eq!(records[1].date, d(2025, 9, 23));
}

#[test]
fn bad_holiday_entries_are_skipped() {
    let json = r#"{"holidays": [
        {"date": "2025-09-15", "name": "Respect for the Aged Day"},
        {"date": "2025/09/16", "name": "Wrong separator"},
        {"name": "No date"},
        "2025-09-17",
        {"date": "2025-09-23", "name": "Autumnal Equinox Day"}
    ]}"#;

    let table = HolidayTable::from_json_str(json).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.contains(d(2025, 9, 15)));
    assert!(table.contains(d(2025, 9, 23)));
    assert!(!table.contains(d(2025, 9, 16)));
    assert!(!table.contains(d(2025, 9, 17)));

    assert!(HolidayTable::from_json_str(r#"{"holidays": {}}"#).is_err());
}

#[test]
fn unreadable_holiday_data_falls_back_to_weekends() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(HolidayTable::from_path(file.path()).is_err());

    let table = HolidayTable::load_or_empty(file.path());
    assert!(table.is_empty());
    let missing = HolidayTable::load_or_empty("/nonexistent/holidays.json");
    assert!(missing.is_empty());

    let calendar = BusinessCalendar::new(&table);
    assert_eq!(calendar.count_business_days(d(2025, 8, 20), d(2025, 8, 25)), 4);
}

#[test]
fn calendar_source_installs_once() {
    let source = CalendarSource::weekends_only();
    assert!(!source.is_ready());
    assert_eq!(
        source.calendar().count_business_days(d(2025, 8, 20), d(2025, 8, 25)),
        4
    );

    let shared = source.clone();
    assert!(shared.install(company_holiday_table()));
    assert!(source.is_ready());
    assert_eq!(
        source.calendar().count_business_days(d(2025, 8, 20), d(2025, 8, 25)),
        3
    );

    assert!(!source.install(HolidayTable::new()));
    assert_eq!(source.table().map(HolidayTable::len), Some(1));
}

#[test]
fn calendar_source_load_failure_stays_not_ready() {
    let source = CalendarSource::weekends_only();
    assert!(!source.load_from_path("/nonexistent/holidays.json"));
    assert!(!source.is_ready());
    assert!(source.table().is_none());
    assert!(source.calendar().is_business_day(d(2025, 8, 21)));
}

#[test]
fn calendar_source_can_be_filled_from_another_thread() {
    let source = CalendarSource::weekends_only();
    let loader = source.clone();
    std::thread::spawn(move || loader.install(company_holiday_table()))
        .join()
        .unwrap();
    assert!(source.is_ready());
    assert!(source.calendar().is_holiday(d(2025, 8, 21)));
}
