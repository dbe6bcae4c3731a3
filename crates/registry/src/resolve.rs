//! Registration-status resolution for a CPF.

use rusqlite::{OptionalExtension, params};

use crate::domain::Cpf;
use crate::error::StoreResult;
use crate::store::SqliteStore;
use crate::types::PersonId;

/// The registration status of a CPF.
///
/// Gates the registration workflow: `NotFound` collects full person and
/// patient data, `PersonOnly` collects patient data against the existing
/// person, `AlreadyPatient` forbids re-registration. The person key is
/// carried only by the variants that have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The CPF is not registered at all.
    NotFound,
    /// Registered as a person with no patient record.
    PersonOnly(PersonId),
    /// Registered as both a person and a patient.
    AlreadyPatient(PersonId),
}

impl Resolution {
    /// The resolved person key, when one exists.
    pub fn person_id(&self) -> Option<PersonId> {
        match self {
            Resolution::NotFound => None,
            Resolution::PersonOnly(id) | Resolution::AlreadyPatient(id) => Some(*id),
        }
    }
}

impl SqliteStore {
    /// Determines whether `cpf` is unregistered, a person, or already a
    /// patient.
    ///
    /// Both lookups run on one pooled connection; a store failure on either
    /// short-circuits with no partial verdict. The CPF column is unique, so
    /// each lookup matches at most one row.
    pub fn resolve(&self, cpf: &Cpf) -> StoreResult<Resolution> {
        let conn = self.get_connection()?;

        let person_id: Option<PersonId> = conn
            .query_row(
                "SELECT id FROM person WHERE cpf = ?1",
                [cpf.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(id) = person_id else {
            return Ok(Resolution::NotFound);
        };

        let has_patient = conn
            .query_row(
                "SELECT 1 FROM patient WHERE person_id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        tracing::debug!(person = %id, has_patient, "resolved cpf");

        if has_patient {
            Ok(Resolution::AlreadyPatient(id))
        } else {
            Ok(Resolution::PersonOnly(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_id_accessor() {
        let id = PersonId::from_bytes([7u8; 16]);
        assert_eq!(Resolution::NotFound.person_id(), None);
        assert_eq!(Resolution::PersonOnly(id).person_id(), Some(id));
        assert_eq!(Resolution::AlreadyPatient(id).person_id(), Some(id));
    }
}
