//! Core admission engine: records, capacity, waitlist, promotion and the façade.

pub mod audit;
pub mod capacity;
pub mod error;
pub mod notify;
pub mod promotion;
pub mod round_lock;
pub mod service;
pub mod status;
pub mod store;
pub mod waitlist;

pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink};
pub use capacity::{CapacityGate, GateDecision};
pub use error::{AppResult, AttendanceError, StoreError};
pub use notify::{AttendanceNotice, NoticeKind, Notifier};
pub use promotion::{PromotionCoordinator, PromotionOutcome, DEFAULT_PROMOTION_ATTEMPTS};
pub use round_lock::{RoundGuard, RoundLocks, RoundSection};
pub use service::{
    Admission, AttendanceOutcome, RequestOptions, RoundAttendanceService, RoundSnapshot,
    SweepReport, WaitlistEntry,
};
pub use status::{AttendanceStatus, StatusStateMachine};
pub use store::{AttendanceRecord, AttendanceStore, Round};
pub use waitlist::WaitlistOrderer;
