//! The dues engine: pure billing-period logic.
//!
//! Everything in this module is a pure function over in-memory period
//! records. No I/O happens here; the payments repository fetches rows,
//! hands them to these functions, and persists the results. That keeps the
//! lifecycle rules (standing classification, monthly accrual, admission
//! charges) independently testable and re-derivable from stored rows at
//! any time.
//!
//! Period ordering is calendar ordering: year first, then calendar month
//! index. Month names are never compared alphabetically.

pub mod accrual;
pub mod period;
pub mod status;

pub use accrual::{accumulated_dues, admission_charge, monthly_charge, ChargePlan};
pub use period::{BillingPeriod, Month};
pub use status::{classify, PaymentStatus, PeriodRecord, Standing, StandingReport};
