pub mod api;
pub mod classification;
pub mod qr;
pub mod report;

pub use api::{ErrorResponse, SubmitResultsRequest, SubmitResultsResponse};
pub use classification::{
    classify_batch, derive_slot_status, ClassificationResponse, ClassifierConfig, Prediction, DRY_WASTE_CLASS,
    WET_WASTE_CLASS,
};
pub use qr::{DecodeFailure, QrSession, ScanAction, HOUSEHOLD_PREFIX};
pub use report::{
    overall_status, CaptureSlot, FlowPhase, FormError, OverallStatus, ReportForm, SlotStatus,
    SLOT_COUNT,
};
