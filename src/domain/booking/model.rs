//! Booking entity

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use crate::support::errors::ParkingError;

/// Allowed booking lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingDuration {
    OneHour,
    TwoHours,
    ThreeHours,
    FourHours,
    EightHours,
    OneDay,
}

impl BookingDuration {
    pub const ALL: [BookingDuration; 6] = [
        Self::OneHour,
        Self::TwoHours,
        Self::ThreeHours,
        Self::FourHours,
        Self::EightHours,
        Self::OneDay,
    ];

    pub fn hours(&self) -> u32 {
        match self {
            Self::OneHour => 1,
            Self::TwoHours => 2,
            Self::ThreeHours => 3,
            Self::FourHours => 4,
            Self::EightHours => 8,
            Self::OneDay => 24,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::hours(i64::from(self.hours()))
    }
}

impl TryFrom<u32> for BookingDuration {
    type Error = ParkingError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|d| d.hours() == hours)
            .ok_or_else(|| {
                ParkingError::Validation(format!(
                    "duration must be one of 1, 2, 3, 4, 8 or 24 hours, got {}",
                    hours
                ))
            })
    }
}

impl fmt::Display for BookingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.hours())
    }
}

// The remote record stores the hour count as a string ("2").
impl Serialize for BookingDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hours().to_string())
    }
}

impl<'de> Deserialize<'de> for BookingDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        let hours = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom)?,
        };
        BookingDuration::try_from(hours).map_err(serde::de::Error::custom)
    }
}

/// A user's reservation of a spot.
///
/// `expiry_time` is advisory: nothing releases the spot when it passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub user_name: String,
    pub vehicle_number: String,
    pub duration: BookingDuration,
    pub booking_time: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        user_name: impl Into<String>,
        vehicle_number: impl Into<String>,
        duration: BookingDuration,
        booking_time: DateTime<Utc>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            vehicle_number: vehicle_number.into(),
            duration,
            booking_time,
            expiry_time: booking_time + duration.as_duration(),
        }
    }

    pub fn duration_hours(&self) -> u32 {
        self.duration.hours()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_time
    }
}

/// User input for a booking, checked before anything touches the store.
#[derive(Debug, Clone, Validate)]
pub struct BookingRequest {
    #[validate(length(min = 1, message = "user name is required"))]
    pub user_name: String,
    #[validate(length(min = 1, message = "vehicle number is required"))]
    pub vehicle_number: String,
    pub duration_hours: u32,
}

impl BookingRequest {
    pub fn new(user_name: &str, vehicle_number: &str, duration_hours: u32) -> Self {
        Self {
            user_name: user_name.trim().to_string(),
            vehicle_number: vehicle_number.trim().to_string(),
            duration_hours,
        }
    }

    /// Validate the form and build the booking stamped at `now`.
    pub fn into_booking(self, now: DateTime<Utc>) -> Result<Booking, ParkingError> {
        self.validate()?;
        let duration = BookingDuration::try_from(self.duration_hours)?;
        Ok(Booking::new(self.user_name, self.vehicle_number, duration, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn expiry_is_booking_time_plus_duration() {
        let b = Booking::new("Alice", "TN01AB1234", BookingDuration::TwoHours, at_noon());
        assert_eq!(b.expiry_time, Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap());
        assert_eq!(b.duration_hours(), 2);
    }

    #[test]
    fn expiry_is_advisory_check_only() {
        let b = Booking::new("Bob", "KA05", BookingDuration::OneHour, at_noon());
        assert!(!b.is_expired(at_noon() + Duration::minutes(59)));
        assert!(b.is_expired(at_noon() + Duration::hours(1)));
    }

    #[test]
    fn only_enumerated_durations_are_accepted() {
        for hours in [1, 2, 3, 4, 8, 24] {
            assert_eq!(BookingDuration::try_from(hours).unwrap().hours(), hours);
        }
        for hours in [0, 5, 6, 12, 48] {
            assert!(matches!(
                BookingDuration::try_from(hours),
                Err(ParkingError::Validation(_))
            ));
        }
    }

    #[test]
    fn blank_fields_fail_validation() {
        let err = BookingRequest::new("   ", "TN01", 1).into_booking(at_noon()).unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));

        let err = BookingRequest::new("Alice", "", 1).into_booking(at_noon()).unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));
    }

    #[test]
    fn request_trims_input() {
        let b = BookingRequest::new(" Alice ", " TN01AB1234", 8)
            .into_booking(at_noon())
            .unwrap();
        assert_eq!(b.user_name, "Alice");
        assert_eq!(b.vehicle_number, "TN01AB1234");
        assert_eq!(b.duration, BookingDuration::EightHours);
    }

    #[test]
    fn wire_form_matches_remote_record() {
        let b = Booking::new("Alice", "TN01AB1234", BookingDuration::TwoHours, at_noon());
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["userName"], "Alice");
        assert_eq!(json["vehicleNumber"], "TN01AB1234");
        assert_eq!(json["duration"], "2");
        assert!(json["bookingTime"].as_str().unwrap().starts_with("2024-05-01T12:00:00"));
        assert!(json["expiryTime"].as_str().unwrap().starts_with("2024-05-01T14:00:00"));
    }

    #[test]
    fn duration_reads_numbers_and_strings() {
        let d: BookingDuration = serde_json::from_str("24").unwrap();
        assert_eq!(d, BookingDuration::OneDay);
        let d: BookingDuration = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(d, BookingDuration::ThreeHours);
        assert!(serde_json::from_str::<BookingDuration>("\"7\"").is_err());
    }
}
