//! Database Models
//!
//! SurrealDB document shapes for the circulation domain.
//! 时间一律 Unix millis (i64)，金额存 f64、运算用 Decimal (见 circulation::fine_math)。

pub mod serde_helpers;

pub mod fine;
pub mod inventory;
pub mod loan;
pub mod member;
pub mod reservation;
pub mod settings;
pub mod staff;

pub use fine::{Fine, FineId, FinePayment, FineStatus, FineType, FineWaive};
pub use inventory::{InventoryCreate, InventoryId, InventoryItem, InventoryUpdate};
pub use loan::{BookCondition, Loan, LoanId, LoanStatus};
pub use member::{Member, MemberCreate, MemberId, MemberStatus, MemberType, MemberUpdate};
pub use reservation::{Reservation, ReservationId, ReservationStatus};
pub use settings::{LibrarySettings, LibrarySettingsUpdate};
pub use staff::{LoginRequest, Staff, StaffCreate, StaffId};
