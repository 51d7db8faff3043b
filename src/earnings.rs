//! Earnings aggregation over the appointment history.
//!
//! Pure functions over an appointment iterator, so the reporting logic is
//! testable without touching the store. Cancelled appointments and blocked
//! slots carry no earnings; pending, confirmed and completed ones all count
//! their snapshotted fee.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::consts;
use crate::models::{Appointment, AppointmentStatus};

/// One reporting period with its appointment count, gross fees and the
/// platform's share.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EarningsBucket {
    pub period: String,
    pub count: usize,
    #[serde(rename = "totalFees")]
    pub total_fees: f64,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsReport {
    pub total_appointments: usize,
    pub total_fees: f64,
    pub total_revenue: f64,
    pub daily: Vec<EarningsBucket>,
    pub monthly: Vec<EarningsBucket>,
    pub yearly: Vec<EarningsBucket>,
}

fn counts(appointment: &Appointment) -> bool {
    !appointment.is_blocked_slot && appointment.status != AppointmentStatus::Cancelled
}

fn bucketize<'a, F>(appointments: &[&'a Appointment], period_of: F) -> Vec<EarningsBucket>
where
    F: Fn(&Appointment) -> String,
{
    // BTreeMap keeps the periods in ascending order for free since all
    // three period formats sort lexicographically.
    let mut buckets: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for appointment in appointments {
        let entry = buckets.entry(period_of(appointment)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += appointment.consultation_fee;
    }

    buckets
        .into_iter()
        .map(|(period, (count, total_fees))| EarningsBucket {
            period,
            count,
            total_fees,
            revenue: total_fees * consts::PLATFORM_CUT,
        })
        .collect()
}

/// Builds the full report: overall totals plus daily, monthly and yearly
/// breakdowns, each sorted by period ascending.
pub fn earnings_report<'a>(appointments: impl Iterator<Item = &'a Appointment>) -> EarningsReport {
    let earning: Vec<&Appointment> = appointments.filter(|a| counts(a)).collect();

    let total_fees: f64 = earning.iter().map(|a| a.consultation_fee).sum();

    EarningsReport {
        total_appointments: earning.len(),
        total_fees,
        total_revenue: total_fees * consts::PLATFORM_CUT,
        daily: bucketize(&earning, |a| a.date.format("%Y-%m-%d").to_string()),
        monthly: bucketize(&earning, |a| a.date.format("%Y-%m").to_string()),
        yearly: bucketize(&earning, |a| a.date.format("%Y").to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentId, UserId};
    use chrono::{NaiveDate, Utc};

    fn appointment(fee: f64, date: NaiveDate, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: AppointmentId::new(),
            patient_id: Some(UserId::new()),
            doctor_id: UserId::new(),
            date,
            time: "10:00".into(),
            status,
            kind: None,
            consultation_fee: fee,
            is_blocked_slot: status == AppointmentStatus::Blocked,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_buckets_group_and_apply_the_cut() {
        let appointments = vec![
            appointment(100.0, date(2025, 1, 10), AppointmentStatus::Completed),
            appointment(200.0, date(2025, 1, 10), AppointmentStatus::Confirmed),
            appointment(50.0, date(2025, 2, 1), AppointmentStatus::Pending),
        ];

        let report = earnings_report(appointments.iter());

        assert_eq!(report.total_appointments, 3);
        assert_eq!(report.total_fees, 350.0);
        assert_eq!(report.total_revenue, 35.0);

        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily[0].period, "2025-01-10");
        assert_eq!(report.daily[0].count, 2);
        assert_eq!(report.daily[0].total_fees, 300.0);
        assert_eq!(report.daily[0].revenue, 30.0);
        assert_eq!(report.daily[1].period, "2025-02-01");
        assert_eq!(report.daily[1].total_fees, 50.0);
        assert_eq!(report.daily[1].revenue, 5.0);

        assert_eq!(report.monthly[0].period, "2025-01");
        assert_eq!(report.monthly[0].total_fees, 300.0);
        assert_eq!(report.monthly[1].period, "2025-02");
        assert_eq!(report.monthly[1].total_fees, 50.0);
    }

    #[test]
    fn monthly_and_yearly_rollups() {
        let appointments = vec![
            appointment(100.0, date(2024, 12, 31), AppointmentStatus::Completed),
            appointment(100.0, date(2025, 1, 1), AppointmentStatus::Completed),
            appointment(100.0, date(2025, 1, 15), AppointmentStatus::Completed),
        ];

        let report = earnings_report(appointments.iter());

        assert_eq!(report.monthly.len(), 2);
        assert_eq!(report.monthly[0].period, "2024-12");
        assert_eq!(report.monthly[1].period, "2025-01");
        assert_eq!(report.monthly[1].count, 2);

        assert_eq!(report.yearly.len(), 2);
        assert_eq!(report.yearly[0].period, "2024");
        assert_eq!(report.yearly[1].period, "2025");
        assert_eq!(report.yearly[1].total_fees, 200.0);
    }

    #[test]
    fn cancelled_and_blocked_do_not_earn() {
        let appointments = vec![
            appointment(100.0, date(2025, 3, 1), AppointmentStatus::Cancelled),
            appointment(0.0, date(2025, 3, 1), AppointmentStatus::Blocked),
            appointment(80.0, date(2025, 3, 2), AppointmentStatus::Completed),
        ];

        let report = earnings_report(appointments.iter());

        assert_eq!(report.total_appointments, 1);
        assert_eq!(report.total_fees, 80.0);
        assert_eq!(report.daily.len(), 1);
        assert_eq!(report.daily[0].period, "2025-03-02");
    }

    #[test]
    fn empty_history_yields_empty_report() {
        let report = earnings_report(std::iter::empty());
        assert_eq!(report.total_appointments, 0);
        assert_eq!(report.total_fees, 0.0);
        assert!(report.daily.is_empty());
        assert!(report.monthly.is_empty());
        assert!(report.yearly.is_empty());
    }
}
