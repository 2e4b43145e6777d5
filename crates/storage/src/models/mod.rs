//! Row shapes returned by `sqlx` queries and their conversions to/from domain types.

pub(crate) mod audit_row;
mod earmark_row;
pub(crate) mod operation_row;
mod pause_row;

pub use audit_row::AuditLogRow;
pub use earmark_row::EarmarkRow;
pub use operation_row::OperationRow;
pub use pause_row::PauseRow;
