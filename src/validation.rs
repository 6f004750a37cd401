use chrono::{Days, NaiveDate, NaiveTime};

use crate::bookings::is_service_slot;
use crate::error::{ApiError, FieldError};
use crate::models::{
    AvailabilityQuery, CateringRequest, FeedbackRequest, NewCateringInquiry, NewFeedback,
    NewReservation, ReservationRequest,
};

pub const MAX_PARTY_SIZE: u32 = 20;
pub const MIN_CATERING_GUESTS: u32 = 10;
pub const MAX_CATERING_GUESTS: u32 = 500;
pub const BOOKING_HORIZON_DAYS: u64 = 180;
const MAX_MESSAGE_LEN: usize = 2000;
const MAX_NOTE_LEN: usize = 500;

// Newlines survive; other control characters and angle brackets do not
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>') && (!c.is_control() || *c == '\n'))
        .take(max_len)
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'))
}

// Collects field errors while the record is being assembled
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    fn name(&mut self, field: &'static str, raw: &str) -> String {
        let name = sanitize_text(raw, 100);
        if name.chars().count() < 2 {
            self.fail(field, "Name must be at least 2 characters");
        }
        name
    }

    fn email(&mut self, raw: &str) -> String {
        let email = raw.trim().to_ascii_lowercase();
        if !is_valid_email(&email) {
            self.fail("email", "Please provide a valid email address");
        }
        email
    }

    fn phone(&mut self, raw: &str) -> String {
        let phone = raw.trim().to_string();
        if !is_valid_phone(&phone) {
            self.fail("phone", "Please provide a valid phone number");
        }
        phone
    }

    fn future_date(&mut self, field: &'static str, raw: &str, today: NaiveDate) -> Option<NaiveDate> {
        let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") else {
            self.fail(field, "Date must use the YYYY-MM-DD format");
            return None;
        };
        let horizon = today.checked_add_days(Days::new(BOOKING_HORIZON_DAYS));
        if date < today {
            self.fail(field, "Date cannot be in the past");
        } else if horizon.is_some_and(|h| date > h) {
            self.fail(field, "Date is too far in the future");
        }
        Some(date)
    }

    fn optional_text(&mut self, field: &'static str, raw: Option<&str>, max_len: usize) -> Option<String> {
        let raw = raw?;
        if raw.trim().chars().count() > max_len {
            self.fail(field, "Text is too long");
        }
        Some(sanitize_text(raw, max_len)).filter(|s| !s.is_empty())
    }

    fn finish<T>(self, record: Option<T>) -> Result<T, ApiError> {
        match record {
            Some(record) if self.errors.is_empty() => Ok(record),
            _ => Err(ApiError::Validation(self.errors)),
        }
    }
}

pub fn validate_reservation(req: &ReservationRequest, today: NaiveDate) -> Result<NewReservation, ApiError> {
    let mut check = Checker::default();

    let name = check.name("name", &req.name);
    let email = check.email(&req.email);
    let phone = check.phone(&req.phone);
    let date = check.future_date("date", &req.date, today);

    let time = match NaiveTime::parse_from_str(req.time.trim(), "%H:%M") {
        Ok(time) if is_service_slot(time) => Some(time),
        Ok(_) => {
            check.fail("time", "Please choose a time during dinner service");
            None
        }
        Err(_) => {
            check.fail("time", "Time must use the HH:MM format");
            None
        }
    };

    if !(1..=MAX_PARTY_SIZE).contains(&req.party_size) {
        check.fail("partySize", "Party size must be between 1 and 20");
    }
    let special_requests = check.optional_text("specialRequests", req.special_requests.as_deref(), MAX_NOTE_LEN);

    let record = date.zip(time).map(|(date, time)| NewReservation {
        name,
        email,
        phone,
        date,
        time,
        party_size: req.party_size,
        special_requests,
    });
    check.finish(record)
}

pub fn validate_catering(req: &CateringRequest, today: NaiveDate) -> Result<NewCateringInquiry, ApiError> {
    let mut check = Checker::default();

    let name = check.name("name", &req.name);
    let email = check.email(&req.email);
    let phone = check.phone(&req.phone);
    let event_date = check.future_date("eventDate", &req.event_date, today);

    if !(MIN_CATERING_GUESTS..=MAX_CATERING_GUESTS).contains(&req.guest_count) {
        check.fail("guestCount", "Catering is available for 10 to 500 guests");
    }
    let event_type = sanitize_text(&req.event_type, 50);
    if event_type.is_empty() {
        check.fail("eventType", "Please tell us what kind of event this is");
    }
    let message = check.optional_text("message", req.message.as_deref(), MAX_MESSAGE_LEN);

    let record = event_date.map(|event_date| NewCateringInquiry {
        name,
        email,
        phone,
        event_date,
        guest_count: req.guest_count,
        event_type,
        message,
    });
    check.finish(record)
}

pub fn validate_feedback(req: &FeedbackRequest) -> Result<NewFeedback, ApiError> {
    let mut check = Checker::default();

    let name = req
        .name
        .as_deref()
        .map(|n| sanitize_text(n, 100))
        .filter(|n| !n.is_empty());
    let email = match req.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        Some(raw) => Some(check.email(raw)),
        None => None,
    };

    if !(1..=5).contains(&req.rating) {
        check.fail("rating", "Rating must be between 1 and 5");
    }
    if req.message.trim().chars().count() > MAX_MESSAGE_LEN {
        check.fail("message", "Message is too long");
    }
    let message = sanitize_text(&req.message, MAX_MESSAGE_LEN);
    if message.is_empty() {
        check.fail("message", "Message cannot be empty");
    }

    check.finish(Some(NewFeedback {
        name,
        email,
        rating: req.rating,
        message,
    }))
}

pub fn validate_availability(query: &AvailabilityQuery, today: NaiveDate) -> Result<(NaiveDate, u32), ApiError> {
    let mut check = Checker::default();
    let date = check.future_date("date", &query.date, today);
    let party_size = query.party_size.unwrap_or(2);
    if !(1..=MAX_PARTY_SIZE).contains(&party_size) {
        check.fail("partySize", "Party size must be between 1 and 20");
    }
    check.finish(date.map(|d| (d, party_size)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn reservation() -> ReservationRequest {
        ReservationRequest {
            name: "  Ada Lovelace ".to_string(),
            email: "Ada@Example.com".to_string(),
            phone: "+1 (555) 010-2030".to_string(),
            date: "2026-10-24".to_string(),
            time: "19:30".to_string(),
            party_size: 4,
            special_requests: Some("<b>window seat</b>".to_string()),
        }
    }

    fn fields(err: ApiError) -> Vec<&'static str> {
        match err {
            ApiError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn sanitize_strips_markup_and_controls() {
        assert_eq!(sanitize_text("  <script>hi</script>\u{0007} ", 100), "scripthi/script");
        assert_eq!(sanitize_text("line one\nline two", 100), "line one\nline two");
        assert_eq!(sanitize_text("abcdef", 3), "abc");
    }

    #[test]
    fn email_and_phone_checks() {
        assert!(is_valid_email("guest@bistro.example"));
        assert!(!is_valid_email("guest@bistro"));
        assert!(!is_valid_email("guest bistro@x.io"));
        assert!(!is_valid_email("@x.io"));
        assert!(is_valid_phone("555-010-2030"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("555-CALL-NOW"));
    }

    #[test]
    fn good_reservation_is_cleaned() {
        let record = validate_reservation(&reservation(), today()).unwrap();
        assert_eq!(record.name, "Ada Lovelace");
        assert_eq!(record.email, "ada@example.com");
        assert_eq!(record.time, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert_eq!(record.special_requests.as_deref(), Some("bwindow seat/b"));
    }

    #[test]
    fn reservation_reports_every_bad_field() {
        let mut req = reservation();
        req.name = "A".to_string();
        req.email = "nope".to_string();
        req.date = "2026-10-01".to_string();
        req.time = "09:00".to_string();
        req.party_size = 0;

        assert_eq!(
            fields(validate_reservation(&req, today()).unwrap_err()),
            vec!["name", "email", "date", "time", "partySize"]
        );
    }

    #[test]
    fn reservation_rejects_unparseable_date() {
        let mut req = reservation();
        req.date = "24/10/2026".to_string();
        assert_eq!(fields(validate_reservation(&req, today()).unwrap_err()), vec!["date"]);
    }

    #[test]
    fn catering_guest_bounds() {
        let req = CateringRequest {
            name: "Grace Hopper".to_string(),
            email: "grace@navy.example".to_string(),
            phone: "555 010 4040".to_string(),
            event_date: "2026-12-01".to_string(),
            guest_count: 8,
            event_type: "Retirement party".to_string(),
            message: None,
        };
        assert_eq!(fields(validate_catering(&req, today()).unwrap_err()), vec!["guestCount"]);

        let ok = CateringRequest { guest_count: 80, ..req };
        assert_eq!(validate_catering(&ok, today()).unwrap().guest_count, 80);
    }

    #[test]
    fn feedback_allows_anonymous_but_checks_rating() {
        let anonymous = FeedbackRequest {
            name: None,
            email: Some("   ".to_string()),
            rating: 5,
            message: "Lovely risotto".to_string(),
        };
        let record = validate_feedback(&anonymous).unwrap();
        assert_eq!(record.email, None);

        let bad = FeedbackRequest {
            rating: 0,
            message: " ".to_string(),
            ..anonymous
        };
        assert_eq!(fields(validate_feedback(&bad).unwrap_err()), vec!["rating", "message"]);
    }

    #[test]
    fn availability_defaults_party_size() {
        let query = AvailabilityQuery {
            date: "2026-10-20".to_string(),
            party_size: None,
        };
        let (date, party) = validate_availability(&query, today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(party, 2);
    }
}
