// Calendar projection of appointments

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Appointment, AppointmentStatus};

/// Every appointment occupies a fixed slot
pub const EVENT_DURATION_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: AppointmentStatus,
}

impl CalendarEvent {
    /// Event for an appointment, or `None` if its date or time is malformed
    pub fn from_appointment(appointment: &Appointment) -> Option<Self> {
        let date = NaiveDate::parse_from_str(appointment.appointment_date.trim(), "%Y-%m-%d").ok()?;
        let time = parse_time(&appointment.appointment_time)?;
        let start = date.and_time(time);

        Some(Self {
            id: appointment.id,
            title: format!("{} - {}", appointment.patient_name, appointment.doctor_name),
            start,
            end: start + Duration::minutes(EVENT_DURATION_MINUTES),
            status: appointment.status,
        })
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Convert appointments to events, skipping any that cannot be placed
pub fn to_events(appointments: &[Appointment]) -> Vec<CalendarEvent> {
    appointments
        .iter()
        .filter_map(|appointment| {
            let event = CalendarEvent::from_appointment(appointment);
            if event.is_none() {
                tracing::warn!(
                    id = appointment.id,
                    date = %appointment.appointment_date,
                    time = %appointment.appointment_time,
                    "Skipping appointment with unparseable date/time"
                );
            }
            event
        })
        .collect()
}

/// Events keyed by day, each day ordered by start time
pub fn group_by_day(events: Vec<CalendarEvent>) -> BTreeMap<NaiveDate, Vec<CalendarEvent>> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for event in events {
        days.entry(event.start.date()).or_default().push(event);
    }
    for day in days.values_mut() {
        day.sort_by_key(|e| (e.start, e.id));
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn appointment(id: i64, date: &str, time: &str) -> Appointment {
        Appointment {
            id,
            patient_name: "Alice".to_string(),
            doctor_name: "Dr. Bob".to_string(),
            appointment_date: date.to_string(),
            appointment_time: time.to_string(),
            status: AppointmentStatus::Pending,
            notes: None,
            cancellation_reason: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_event_from_appointment() {
        let event = CalendarEvent::from_appointment(&appointment(1, "2025-06-02", "09:45")).unwrap();
        assert_eq!(event.title, "Alice - Dr. Bob");
        assert_eq!(event.start.to_string(), "2025-06-02 09:45:00");
        assert_eq!(event.end.to_string(), "2025-06-02 10:15:00");
        assert_eq!(event.status, AppointmentStatus::Pending);
    }

    #[test]
    fn test_event_accepts_seconds() {
        let event = CalendarEvent::from_appointment(&appointment(1, "2025-06-02", "14:00:00")).unwrap();
        assert_eq!(event.end - event.start, Duration::minutes(30));
    }

    #[test]
    fn test_event_crossing_midnight() {
        let event = CalendarEvent::from_appointment(&appointment(1, "2025-06-02", "23:45")).unwrap();
        assert_eq!(event.end.to_string(), "2025-06-03 00:15:00");
    }

    #[test]
    fn test_malformed_appointments_skipped() {
        let events = to_events(&[
            appointment(1, "2025-06-02", "09:00"),
            appointment(2, "02/06/2025", "09:00"),
            appointment(3, "2025-06-02", "nine"),
            appointment(4, "2025-02-30", "09:00"),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 1);
    }

    #[test]
    fn test_group_by_day_sorted() {
        let events = to_events(&[
            appointment(1, "2025-06-03", "08:00"),
            appointment(2, "2025-06-02", "15:00"),
            appointment(3, "2025-06-02", "09:00"),
        ]);
        let days = group_by_day(events);

        let keys: Vec<String> = days.keys().map(|d| d.to_string()).collect();
        assert_eq!(keys, vec!["2025-06-02", "2025-06-03"]);

        let first_day: Vec<i64> = days.values().next().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(first_day, vec![3, 2]);
    }
}
