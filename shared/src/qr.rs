use derive_more::{Deref, Display, Into};
use serde::{Deserialize, Serialize};

/// Household QR codes carry this literal prefix.
pub const HOUSEHOLD_PREFIX: &str = "HS";

const NOT_FOUND_NAME: &str = "NotFoundException";
const NOT_FOUND_MESSAGE: &str = "No QR code found";

/// A decoded QR payload that identifies a household.
#[derive(Clone, Debug, PartialEq, Eq, Display, Deref, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QrSession(String);

impl QrSession {
    /// Accepts `payload` only if it follows the household convention.
    pub fn accept(payload: &str) -> Option<Self> {
        payload
            .starts_with(HOUSEHOLD_PREFIX)
            .then(|| Self(payload.to_string()))
    }

    pub fn house_id(&self) -> &str {
        &self.0
    }
}

/// A failed decode attempt reported by the scanner library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeFailure {
    /// No code in the current frame.
    NotFound,
    Other(String),
}

/// What the scanner loop does after a decode failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanAction {
    Ignore,
    Restart,
}

impl DecodeFailure {
    /// Classifies a scanner error from its error name or message.
    pub fn classify(name_or_message: &str) -> Self {
        if name_or_message == NOT_FOUND_NAME || name_or_message.contains(NOT_FOUND_MESSAGE) {
            DecodeFailure::NotFound
        } else {
            DecodeFailure::Other(name_or_message.to_string())
        }
    }

    pub fn action(&self) -> ScanAction {
        match self {
            DecodeFailure::NotFound => ScanAction::Ignore,
            DecodeFailure::Other(_) => ScanAction::Restart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_household_prefix() {
        let session = QrSession::accept("HS12345").unwrap();
        assert_eq!(session.house_id(), "HS12345");
        assert_eq!(session.to_string(), "HS12345");
    }

    #[test]
    fn rejects_other_payloads() {
        assert_eq!(QrSession::accept("XX12345"), None);
        assert_eq!(QrSession::accept("hs12345"), None);
        assert_eq!(QrSession::accept(""), None);
        assert_eq!(QrSession::accept(" HS1"), None);
    }

    #[test]
    fn not_found_errors_are_ignored() {
        assert_eq!(DecodeFailure::classify("NotFoundException").action(), ScanAction::Ignore);
        assert_eq!(DecodeFailure::classify("No QR code found").action(), ScanAction::Ignore);
        assert_eq!(
            DecodeFailure::classify("Scanner error: No QR code found").action(),
            ScanAction::Ignore
        );
    }

    #[test]
    fn other_errors_restart_the_scanner() {
        let failure = DecodeFailure::classify("NotAllowedError");
        assert_eq!(failure, DecodeFailure::Other("NotAllowedError".into()));
        assert_eq!(failure.action(), ScanAction::Restart);
    }
}
