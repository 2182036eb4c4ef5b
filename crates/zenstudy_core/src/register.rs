//! crates/zenstudy_core/src/register.rs
//!
//! Student registration: validate, create the roster row, seed the
//! zeroed stats row.

use crate::domain::{Batch, Student};
use crate::ports::{AttendanceStore, PortError};

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("a name is required")]
    EmptyName,
    #[error(transparent)]
    Storage(#[from] PortError),
}

/// Registers a student and initializes their stats.
///
/// Validation happens before any storage call; a blank or whitespace-only
/// name never reaches the store.
pub async fn register_student(
    store: &dyn AttendanceStore,
    name: &str,
    batch: Batch,
) -> Result<Student, RegisterError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RegisterError::EmptyName);
    }

    let student = store.create_student(name, batch).await?;
    store.create_stats(student.id).await?;
    Ok(student)
}
