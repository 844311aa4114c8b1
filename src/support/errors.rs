use thiserror::Error;

use crate::domain::Category;

/// Errors reported by the parking store to its host.
///
/// None of these are fatal: the host shows them to the user, who may retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParkingError {
    #[error("Validation: {0}")]
    Validation(String),

    #[error("{category} spot {id} is occupied")]
    Occupied { category: Category, id: u32 },

    #[error("{category} spot {id} is already booked")]
    AlreadyBooked { category: Category, id: u32 },

    #[error("{category} spot {id} has no booking")]
    NotBooked { category: Category, id: u32 },

    #[error("Not found: {category} spot {id}")]
    SpotNotFound { category: Category, id: u32 },

    #[error("Store write failed: {0}")]
    StoreWrite(String),
}

impl ParkingError {
    /// Short label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ParkingError::Validation(_) => "validation",
            ParkingError::Occupied { .. } => "occupied",
            ParkingError::AlreadyBooked { .. } => "already_booked",
            ParkingError::NotBooked { .. } => "not_booked",
            ParkingError::SpotNotFound { .. } => "not_found",
            ParkingError::StoreWrite(_) => "store_write",
        }
    }

    /// Whether the user may succeed by retrying after the board refreshes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ParkingError::Occupied { .. }
                | ParkingError::AlreadyBooked { .. }
                | ParkingError::StoreWrite(_)
        )
    }
}

impl From<validator::ValidationErrors> for ParkingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ParkingError::Validation(errors.to_string())
    }
}

pub type ParkingResult<T> = Result<T, ParkingError>;

/// Errors raised by a feed adapter when writing to the remote database.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected at {path}: {reason}")]
    Rejected { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<FeedError> for ParkingError {
    fn from(err: FeedError) -> Self {
        ParkingError::StoreWrite(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(ParkingError::StoreWrite("timeout".into()).is_retryable());
        assert!(ParkingError::Occupied { category: Category::Car, id: 1 }.is_retryable());
        assert!(!ParkingError::Validation("empty".into()).is_retryable());
        assert!(!ParkingError::SpotNotFound { category: Category::Bike, id: 9 }.is_retryable());
    }

    #[test]
    fn feed_error_maps_to_store_write() {
        let err: ParkingError = FeedError::Unavailable("offline".into()).into();
        assert_eq!(err, ParkingError::StoreWrite("Feed unavailable: offline".into()));
    }

    #[test]
    fn display_names_the_spot() {
        let err = ParkingError::Occupied { category: Category::HeavyVehicle, id: 2 };
        assert_eq!(err.to_string(), "heavy vehicle spot 2 is occupied");
    }
}
