use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::api::SubmitResultsRequest;
use crate::classification::{derive_slot_status, Prediction};
use crate::qr::QrSession;

/// Photo positions per household report.
pub const SLOT_COUNT: usize = 3;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum SlotStatus {
    Mixed,
    Segregated,
    Manual,
    Unknown,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum OverallStatus {
    Mixed,
    Segregated,
    Unknown,
}

/// Aggregates slot labels: Mixed dominates Segregated, which dominates
/// everything else.
pub fn overall_status(labels: &[Option<SlotStatus>]) -> OverallStatus {
    let has = |status: SlotStatus| labels.iter().any(|label| *label == Some(status));
    if has(SlotStatus::Mixed) {
        OverallStatus::Mixed
    } else if has(SlotStatus::Segregated) {
        OverallStatus::Segregated
    } else {
        OverallStatus::Unknown
    }
}

/// Stages of one household report in the browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum FlowPhase {
    Idle,
    Scanning,
    QrAccepted,
    Capturing,
    Classifying,
    ResultsReview,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("Scan a household QR code first")]
    NoQrSession,
    #[error("QR code '{payload}' is not a household code")]
    InvalidQr { payload: String },
    #[error("Slot {index} does not exist")]
    SlotOutOfRange { index: usize },
    #[error("Please upload at least one image before submitting.")]
    NoImages,
    #[error("Slot {index} already has a status")]
    ManualOverrideNotAllowed { index: usize },
    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        phase: FlowPhase,
        action: &'static str,
    },
}

/// One of the photo positions of a report.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureSlot<I> {
    pub image: Option<I>,
    pub predictions: Option<Vec<Prediction>>,
    pub status: Option<SlotStatus>,
}

impl<I> Default for CaptureSlot<I> {
    fn default() -> Self {
        Self {
            image: None,
            predictions: None,
            status: None,
        }
    }
}

impl<I> CaptureSlot<I> {
    fn with_image(image: I) -> Self {
        Self {
            image: Some(image),
            predictions: None,
            status: None,
        }
    }

    pub fn has_predictions(&self) -> bool {
        self.predictions.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// An uploaded photo the classifier found nothing in, not yet resolved.
    pub fn needs_manual_choice(&self) -> bool {
        self.image.is_some() && !self.has_predictions() && self.status.is_none()
    }

    /// Label sent to the server for this slot; `None` for an empty slot.
    pub fn submission_label(&self) -> Option<SlotStatus> {
        self.image.as_ref()?;
        Some(match self.status {
            Some(status) => status,
            None if !self.has_predictions() => SlotStatus::Manual,
            None => SlotStatus::Unknown,
        })
    }
}

/// Form state for one household report.
///
/// Updates never mutate in place: every operation returns a new form, so a
/// rejected action leaves the caller's state untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportForm<I> {
    session: Option<QrSession>,
    slots: [CaptureSlot<I>; SLOT_COUNT],
    phase: FlowPhase,
    before_scan: FlowPhase,
}

impl<I> Default for ReportForm<I> {
    fn default() -> Self {
        Self {
            session: None,
            slots: empty_slots(),
            phase: FlowPhase::Idle,
            before_scan: FlowPhase::Idle,
        }
    }
}

fn empty_slots<I>() -> [CaptureSlot<I>; SLOT_COUNT] {
    std::array::from_fn(|_| CaptureSlot::default())
}

impl<I> ReportForm<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form resuming a previously accepted household.
    pub fn resume(session: QrSession) -> Self {
        Self {
            session: Some(session),
            slots: empty_slots(),
            phase: FlowPhase::QrAccepted,
            before_scan: FlowPhase::QrAccepted,
        }
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&QrSession> {
        self.session.as_ref()
    }

    pub fn slots(&self) -> &[CaptureSlot<I>; SLOT_COUNT] {
        &self.slots
    }

    pub fn has_images(&self) -> bool {
        self.slots.iter().any(|slot| slot.image.is_some())
    }

    pub fn uploads_enabled(&self) -> bool {
        self.session.is_some() && matches!(self.phase, FlowPhase::QrAccepted | FlowPhase::Capturing)
    }

    pub fn is_reviewing(&self) -> bool {
        matches!(self.phase, FlowPhase::ResultsReview | FlowPhase::Submitting)
            || (self.phase == FlowPhase::Scanning && self.before_scan == FlowPhase::ResultsReview)
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FlowPhase::Submitting
    }

    fn require_phase(&self, allowed: &[FlowPhase], action: &'static str) -> Result<(), FormError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(FormError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn require_session(&self) -> Result<&QrSession, FormError> {
        self.session.as_ref().ok_or(FormError::NoQrSession)
    }

    fn check_index(index: usize) -> Result<(), FormError> {
        if index < SLOT_COUNT {
            Ok(())
        } else {
            Err(FormError::SlotOutOfRange { index })
        }
    }

    /// Form with a fresh session and empty slots.
    pub fn accept_qr(&self, payload: &str) -> Result<Self, FormError> {
        self.require_phase(&[FlowPhase::Scanning], "accept a QR code")?;
        let session = QrSession::accept(payload).ok_or_else(|| FormError::InvalidQr {
            payload: payload.to_string(),
        })?;
        Ok(Self::resume(session))
    }

    /// Empty slots, keeping the current household.
    pub fn reset(&self) -> Self {
        let settled = if self.session.is_some() {
            FlowPhase::Capturing
        } else {
            FlowPhase::Idle
        };
        let phase = if self.phase == FlowPhase::Scanning {
            FlowPhase::Scanning
        } else {
            settled
        };
        Self {
            session: self.session.clone(),
            slots: empty_slots(),
            phase,
            before_scan: settled,
        }
    }

    /// Clears the household and slots after the server stored the report.
    pub fn finish_submission(&self) -> Self {
        Self {
            session: None,
            slots: empty_slots(),
            phase: FlowPhase::Submitted,
            before_scan: FlowPhase::Submitted,
        }
    }
}

impl<I: Clone> ReportForm<I> {
    pub fn open_scanner(&self) -> Result<Self, FormError> {
        if self.phase == FlowPhase::Scanning {
            return Ok(self.clone());
        }
        self.require_phase(
            &[
                FlowPhase::Idle,
                FlowPhase::QrAccepted,
                FlowPhase::Capturing,
                FlowPhase::ResultsReview,
                FlowPhase::Submitted,
            ],
            "open the scanner",
        )?;
        Ok(Self {
            phase: FlowPhase::Scanning,
            before_scan: self.phase,
            ..self.clone()
        })
    }

    /// Leaves the scanner without a household code, back where it was opened.
    pub fn close_scanner(&self) -> Self {
        if self.phase != FlowPhase::Scanning {
            return self.clone();
        }
        Self {
            phase: self.before_scan,
            ..self.clone()
        }
    }

    pub fn with_image(&self, index: usize, image: I) -> Result<Self, FormError> {
        self.require_session()?;
        Self::check_index(index)?;
        self.require_phase(&[FlowPhase::QrAccepted, FlowPhase::Capturing], "upload a photo")?;

        let mut slots = self.slots.clone();
        slots[index] = CaptureSlot::with_image(image);
        Ok(Self {
            slots,
            phase: FlowPhase::Capturing,
            before_scan: FlowPhase::Capturing,
            session: self.session.clone(),
        })
    }

    pub fn begin_classification(&self) -> Result<Self, FormError> {
        self.require_session()?;
        self.require_phase(&[FlowPhase::QrAccepted, FlowPhase::Capturing], "classify photos")?;
        if !self.has_images() {
            return Err(FormError::NoImages);
        }
        Ok(Self {
            phase: FlowPhase::Classifying,
            ..self.clone()
        })
    }

    /// Stores the classifier output of every slot and derives statuses.
    ///
    /// `outputs[i]` belongs to slot `i`; missing entries count as no output.
    pub fn with_classification(&self, outputs: Vec<Option<Vec<Prediction>>>) -> Result<Self, FormError> {
        self.require_phase(&[FlowPhase::Classifying], "store classifications")?;

        let mut outputs = outputs.into_iter();
        let slots = std::array::from_fn(|i| {
            let predictions = outputs.next().flatten();
            let status = predictions.as_deref().and_then(derive_slot_status);
            CaptureSlot {
                image: self.slots[i].image.clone(),
                predictions,
                status,
            }
        });
        Ok(Self {
            slots,
            phase: FlowPhase::ResultsReview,
            before_scan: FlowPhase::ResultsReview,
            session: self.session.clone(),
        })
    }

    /// Back to capturing with every slot as it was before the batch started.
    pub fn classification_failed(&self) -> Result<Self, FormError> {
        self.require_phase(&[FlowPhase::Classifying], "abort classification")?;
        Ok(Self {
            phase: FlowPhase::Capturing,
            ..self.clone()
        })
    }

    pub fn with_manual_status(&self, index: usize, status: SlotStatus) -> Result<Self, FormError> {
        Self::check_index(index)?;
        self.require_phase(&[FlowPhase::ResultsReview], "choose a status")?;
        if !self.slots[index].needs_manual_choice() {
            return Err(FormError::ManualOverrideNotAllowed { index });
        }

        let mut slots = self.slots.clone();
        slots[index].status = Some(status);
        Ok(Self {
            slots,
            ..self.clone()
        })
    }

    /// Locks the reviewed results while they are being posted.
    pub fn begin_submission(&self) -> Result<Self, FormError> {
        self.require_session()?;
        self.require_phase(&[FlowPhase::ResultsReview], "submit results")?;
        Ok(Self {
            phase: FlowPhase::Submitting,
            ..self.clone()
        })
    }

    /// Back to review after the server rejected or never received the report.
    pub fn submission_failed(&self) -> Result<Self, FormError> {
        self.require_phase(&[FlowPhase::Submitting], "abort submission")?;
        Ok(Self {
            phase: FlowPhase::ResultsReview,
            ..self.clone()
        })
    }

    /// Builds the record posted to the server.
    ///
    /// `encoded_images[i]` is the base64 body of slot `i`; it is only sent for
    /// slots that hold a photo.
    pub fn submission(
        &self,
        encoded_images: [Option<String>; SLOT_COUNT],
    ) -> Result<SubmitResultsRequest, FormError> {
        let session = self.require_session()?;
        self.require_phase(
            &[FlowPhase::ResultsReview, FlowPhase::Submitting],
            "submit results",
        )?;

        let labels: Vec<Option<SlotStatus>> =
            self.slots.iter().map(CaptureSlot::submission_label).collect();
        let images = self
            .slots
            .iter()
            .zip(encoded_images)
            .map(|(slot, encoded)| slot.image.as_ref().and(encoded))
            .collect();

        Ok(SubmitResultsRequest {
            qr_code_data: Some(session.house_id().to_string()),
            predictions: labels
                .iter()
                .map(|label| label.map(|status| status.to_string()))
                .collect(),
            images,
            overall_status: Some(overall_status(&labels).to_string()),
        })
    }
}
