use chrono::{NaiveDate, NaiveTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ApiError;
use crate::models::{NewCateringInquiry, NewFeedback, NewReservation, Stored};

pub const DEFAULT_SEATS_PER_SLOT: u32 = 40;

// Dinner service: 17:00 to 21:30, every half hour
const FIRST_SEATING: (u32, u32) = (17, 0);
const SEATINGS: u32 = 10;

pub fn service_slots() -> impl Iterator<Item = NaiveTime> {
    (0..SEATINGS).filter_map(|i| {
        let minutes = FIRST_SEATING.0 * 60 + FIRST_SEATING.1 + i * 30;
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
    })
}

pub fn is_service_slot(time: NaiveTime) -> bool {
    service_slots().any(|slot| slot == time)
}

/// In-memory stand-in for the hosted database. Rows live as long as the
/// process does.
pub struct Repository {
    next_id: AtomicU64,
    seats_per_slot: u32,
    booked_seats: DashMap<(NaiveDate, NaiveTime), u32>,
    reservations: DashMap<u64, Stored<NewReservation>>,
    catering: DashMap<u64, Stored<NewCateringInquiry>>,
    feedback: DashMap<u64, Stored<NewFeedback>>,
}

impl Repository {
    pub fn new(seats_per_slot: u32) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            seats_per_slot,
            booked_seats: DashMap::new(),
            reservations: DashMap::new(),
            catering: DashMap::new(),
            feedback: DashMap::new(),
        }
    }

    fn stamp<T>(&self, record: T) -> Stored<T> {
        Stored {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            created_at: Utc::now(),
            record,
        }
    }

    /// Books seats for the slot, failing when the slot cannot seat the party.
    pub fn insert_reservation(&self, reservation: NewReservation) -> Result<Stored<NewReservation>, ApiError> {
        {
            let mut booked = self
                .booked_seats
                .entry((reservation.date, reservation.time))
                .or_insert(0);
            if *booked + reservation.party_size > self.seats_per_slot {
                return Err(ApiError::Conflict(format!(
                    "{} at {} is fully booked",
                    reservation.date,
                    reservation.time.format("%H:%M")
                )));
            }
            *booked += reservation.party_size;
        }

        let stored = self.stamp(reservation);
        self.reservations.insert(stored.id, stored.clone());
        Ok(stored)
    }

    pub fn insert_catering(&self, inquiry: NewCateringInquiry) -> Stored<NewCateringInquiry> {
        let stored = self.stamp(inquiry);
        self.catering.insert(stored.id, stored.clone());
        stored
    }

    pub fn insert_feedback(&self, feedback: NewFeedback) -> Stored<NewFeedback> {
        let stored = self.stamp(feedback);
        self.feedback.insert(stored.id, stored.clone());
        stored
    }

    // Oldest first
    pub fn reservations(&self) -> Vec<Stored<NewReservation>> {
        let mut rows: Vec<_> = self.reservations.iter().map(|r| r.value().clone()).collect();
        rows.sort_by_key(|r| r.id);
        rows
    }

    #[cfg(test)]
    pub fn catering_count(&self) -> usize {
        self.catering.len()
    }

    #[cfg(test)]
    pub fn feedback_count(&self) -> usize {
        self.feedback.len()
    }

    pub fn available_slots(&self, date: NaiveDate, party_size: u32) -> Vec<NaiveTime> {
        service_slots()
            .filter(|&slot| {
                let booked = self.booked_seats.get(&(date, slot)).map_or(0, |b| *b);
                booked + party_size <= self.seats_per_slot
            })
            .collect()
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(DEFAULT_SEATS_PER_SLOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn booking(party_size: u32) -> NewReservation {
        NewReservation {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "5550102030".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 24).unwrap(),
            time: at(19, 0),
            party_size,
            special_requests: None,
        }
    }

    #[test]
    fn slots_cover_dinner_service() {
        let slots: Vec<_> = service_slots().collect();
        assert_eq!(slots.first(), Some(&at(17, 0)));
        assert_eq!(slots.last(), Some(&at(21, 30)));
        assert_eq!(slots.len(), 10);
        assert!(is_service_slot(at(18, 30)));
        assert!(!is_service_slot(at(18, 15)));
    }

    #[test]
    fn full_slot_rejects_and_disappears_from_availability() {
        let repo = Repository::new(6);
        let first = repo.insert_reservation(booking(4)).unwrap();
        assert_eq!(first.id, 1);

        assert!(matches!(repo.insert_reservation(booking(3)), Err(ApiError::Conflict(_))));
        assert!(repo.insert_reservation(booking(2)).is_ok());

        let date = booking(1).date;
        assert!(!repo.available_slots(date, 1).contains(&at(19, 0)));
        assert!(repo.available_slots(date, 6).contains(&at(19, 30)));
        assert_eq!(repo.reservations().len(), 2);
    }

    #[test]
    fn ids_are_shared_across_tables() {
        let repo = Repository::default();
        let feedback = repo.insert_feedback(NewFeedback {
            name: None,
            email: None,
            rating: 4,
            message: "Great".to_string(),
        });
        let reservation = repo.insert_reservation(booking(2)).unwrap();
        assert!(reservation.id > feedback.id);
        assert_eq!(repo.feedback_count(), 1);
        assert_eq!(repo.catering_count(), 0);
    }
}
