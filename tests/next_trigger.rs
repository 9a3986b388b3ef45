#![forbid(unsafe_code)]
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Europe::Paris;
use shiftclock::{
    alarm::{arm_all, next_trigger, next_trigger_with_holidays, plan_alarms},
    AlarmScheduler, AlarmTrigger, HolidayRecord, HolidayTable, RotationConfig, RotationIdentity,
    Settings, Shift, ShiftError, TriggerSource,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn utc(y: i32, m: u32, day: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, day, h, min, 0).unwrap()
}

fn four_three() -> RotationConfig {
    RotationConfig::new(RotationIdentity::FourThree, d(2024, 6, 1), 0)
}

#[test]
fn night_alarm_rings_the_evening_before() {
    let now = utc(2024, 6, 6, 23, 0);
    let trigger = next_trigger(Shift::Night, "22:00", &four_three(), &now).unwrap();
    // nuit du 7 déjà passée (réveil le 6 à 22:00), nuit du 8 -> réveil le 7
    assert_eq!(trigger.shift_date, d(2024, 6, 8));
    assert_eq!(trigger.at, utc(2024, 6, 7, 22, 0));
    assert_eq!(trigger.source, TriggerSource::Pattern);
}

#[test]
fn past_night_block_moves_to_next_cycle() {
    let now = utc(2024, 6, 7, 23, 0);
    let trigger = next_trigger(Shift::Night, "22:00", &four_three(), &now).unwrap();
    assert_eq!(trigger.shift_date, d(2024, 6, 15));
    assert_eq!(trigger.at, utc(2024, 6, 14, 22, 0));
}

#[test]
fn same_day_morning_already_past() {
    let now = utc(2024, 6, 3, 6, 0);
    let trigger = next_trigger(Shift::Morning, "05:30", &four_three(), &now).unwrap();
    assert_eq!(trigger.at, utc(2024, 6, 4, 5, 30));
}

#[test]
fn trigger_equal_to_now_is_not_future() {
    let now = utc(2024, 6, 4, 5, 30);
    let trigger = next_trigger(Shift::Morning, "05:30", &four_three(), &now).unwrap();
    assert!(trigger.at > now);
    assert_eq!(trigger.at, utc(2024, 6, 11, 5, 30));
}

#[test]
fn unparseable_time_is_reported() {
    let now = utc(2024, 6, 1, 0, 0);
    let err = next_trigger(Shift::Morning, "5h30", &four_three(), &now).unwrap_err();
    assert!(matches!(err, ShiftError::InvalidLocalTime(ref raw) if raw == "5h30"));
}

#[test]
fn exhausted_horizon_falls_back_to_tomorrow() {
    // aucun après-midi en journée fixe : repli sur le lendemain (anomalie connue)
    let cfg = RotationConfig::new(RotationIdentity::LongDay, d(2024, 1, 1), 0);
    let now = utc(2024, 6, 6, 10, 0);
    let trigger = next_trigger(Shift::Afternoon, "12:30", &cfg, &now).unwrap();
    assert_eq!(trigger.source, TriggerSource::Fallback);
    assert_eq!(trigger.at, utc(2024, 6, 7, 12, 30));
    assert!(trigger.at > now);
}

#[test]
fn search_is_deterministic() {
    let now = utc(2024, 9, 17, 8, 15);
    let a = next_trigger(Shift::Afternoon, "12:30", &four_three(), &now).unwrap();
    let b = next_trigger(Shift::Afternoon, "12:30", &four_three(), &now).unwrap();
    assert_eq!(a, b);
}

#[test]
fn observed_holiday_skips_a_working_day() {
    let cfg = RotationConfig::new(RotationIdentity::FourTwo, d(2024, 6, 1), 0);
    let holidays = HolidayTable::from_records([HolidayRecord::new(d(2024, 6, 5), "Férié", true)]);
    let now = utc(2024, 6, 2, 0, 0);

    let honored =
        next_trigger_with_holidays(Shift::Morning, "05:30", &cfg, &holidays, true, &now).unwrap();
    assert_eq!(honored.at, utc(2024, 6, 9, 5, 30));

    let ignored =
        next_trigger_with_holidays(Shift::Morning, "05:30", &cfg, &holidays, false, &now).unwrap();
    assert_eq!(ignored.at, utc(2024, 6, 5, 5, 30));
}

#[test]
fn night_trigger_crosses_month_boundary() {
    let cfg = RotationConfig::new(RotationIdentity::FourTwo, d(2024, 3, 1), 1);
    let now = utc(2024, 2, 28, 12, 0);
    let trigger = next_trigger(Shift::Night, "22:00", &cfg, &now).unwrap();
    assert_eq!(trigger.shift_date, d(2024, 3, 1));
    assert_eq!(trigger.at, utc(2024, 2, 29, 22, 0));
}

#[test]
fn spring_forward_gap_moves_to_first_valid_instant() {
    let cfg = RotationConfig::new(RotationIdentity::FourTwo, d(2024, 3, 31), 0);
    let now = Paris.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap();
    let trigger = next_trigger(Shift::Morning, "02:30", &cfg, &now).unwrap();
    assert_eq!(trigger.at.to_rfc3339(), "2024-03-31T03:00:00+02:00");
}

#[test]
fn local_timezone_uses_local_calendar_date() {
    // 23:30 UTC le 2 juin = 01:30 à Paris le 3 juin
    let now = utc(2024, 6, 2, 23, 30).with_timezone(&Paris);
    let trigger = next_trigger(Shift::Morning, "05:30", &four_three(), &now).unwrap();
    assert_eq!(trigger.at.to_rfc3339(), "2024-06-03T05:30:00+02:00");
}

fn four_three_settings() -> Settings {
    let mut settings = Settings::default();
    settings.set_rotation(four_three());
    settings
}

#[test]
fn plan_lists_every_working_shift_in_order() {
    let settings = four_three_settings();
    let plan = plan_alarms(&settings, &HolidayTable::new(), &utc(2024, 6, 1, 0, 0)).unwrap();
    let summary: Vec<_> = plan.iter().map(|t| (t.shift, t.at)).collect();
    assert_eq!(
        summary,
        vec![
            (Shift::Morning, utc(2024, 6, 3, 5, 30)),
            (Shift::Afternoon, utc(2024, 6, 5, 12, 30)),
            (Shift::Night, utc(2024, 6, 6, 22, 0)),
        ]
    );
}

#[test]
fn plan_fails_on_corrupt_alarm_time() {
    let mut settings = four_three_settings();
    settings.alarm_times.insert(Shift::Night, "late".into());
    let err = plan_alarms(&settings, &HolidayTable::new(), &utc(2024, 6, 1, 0, 0)).unwrap_err();
    assert!(matches!(err, ShiftError::InvalidLocalTime(_)));
}

#[derive(Default)]
struct RecordingScheduler {
    armed: Vec<(Shift, DateTime<Utc>)>,
    cancelled: Vec<Shift>,
}

impl AlarmScheduler<Utc> for RecordingScheduler {
    fn arm(&mut self, trigger: &AlarmTrigger<Utc>) -> anyhow::Result<()> {
        self.armed.push((trigger.shift, trigger.at));
        Ok(())
    }

    fn cancel(&mut self, shift: Shift) -> anyhow::Result<()> {
        self.cancelled.push(shift);
        Ok(())
    }
}

#[test]
fn arm_all_cancels_shifts_without_alarm() {
    let settings = four_three_settings();
    let plan = plan_alarms(&settings, &HolidayTable::new(), &utc(2024, 6, 1, 0, 0)).unwrap();
    let mut scheduler = RecordingScheduler::default();
    arm_all(&mut scheduler, &plan).unwrap();
    assert_eq!(scheduler.cancelled, vec![Shift::Day]);
    assert_eq!(scheduler.armed.len(), 3);
}
