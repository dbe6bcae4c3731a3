//! Two-table transactional registration of a patient.

use rusqlite::{Transaction, params};

use crate::domain::Phone;
use crate::error::{RegistryError, RegistryResult, StoreError};
use crate::resolve::Resolution;
use crate::store::SqliteStore;
use crate::types::{PatientFields, PersonFields, PersonId};

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Both writes committed; carries the (possibly newly generated) person
    /// key.
    Registered(PersonId),
    /// The CPF is already a patient; nothing was written.
    Aborted,
}

/// What the transaction will do about the person row.
enum PersonWrite<'a> {
    Reuse(PersonId),
    Insert(&'a PersonFields),
}

impl SqliteStore {
    /// Registers a patient according to a prior [`Resolution`].
    ///
    /// `person` must be present when the resolution is
    /// [`Resolution::NotFound`] and is ignored otherwise (the resolved key
    /// wins). Field bundles carry only validated value types, so nothing is
    /// revalidated here.
    ///
    /// Both writes run in one transaction: the person insert (when needed)
    /// captures the store-generated key, the patient insert references it,
    /// and the commit happens only after both succeed. Any failure rolls the
    /// whole unit back: no person row is left without its patient row having
    /// been attempted, and no half-written patient row survives.
    pub fn register_patient(
        &self,
        resolution: Resolution,
        person: Option<&PersonFields>,
        patient: &PatientFields,
    ) -> RegistryResult<RegisterOutcome> {
        let write = match resolution {
            Resolution::AlreadyPatient(id) => {
                tracing::debug!(person = %id, "cpf is already a patient, aborting");
                return Ok(RegisterOutcome::Aborted);
            }
            Resolution::PersonOnly(id) => {
                if person.is_some() {
                    tracing::debug!(person = %id, "person fields ignored for an existing person");
                }
                PersonWrite::Reuse(id)
            }
            Resolution::NotFound => match person {
                Some(fields) => PersonWrite::Insert(fields),
                None => return Err(RegistryError::MissingPersonFields),
            },
        };

        let mut conn = self.get_connection()?;
        // Dropping the transaction without committing rolls it back, so every
        // early error exit below leaves the store untouched.
        let tx = conn.transaction().map_err(StoreError::from)?;

        let person_id = match write {
            PersonWrite::Reuse(id) => id,
            PersonWrite::Insert(fields) => insert_person(&tx, fields)?,
        };

        insert_patient(&tx, person_id, patient)?;

        tx.commit().map_err(|e| StoreError::RolledBack {
            reason: e.to_string(),
        })?;

        tracing::info!(person = %person_id, "patient registered");
        Ok(RegisterOutcome::Registered(person_id))
    }
}

fn insert_person(tx: &Transaction<'_>, fields: &PersonFields) -> Result<PersonId, StoreError> {
    let address = fields.address.as_ref();
    let id = tx.query_row(
        "INSERT INTO person (cpf, name, state, city, district, street, number, phone1, phone2)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         RETURNING id",
        params![
            fields.cpf.as_str(),
            fields.name.as_str(),
            address.map(|a| a.state().as_str()),
            address.map(|a| a.city()),
            address.map(|a| a.district()),
            address.map(|a| a.street()),
            address.map(|a| a.number().value()),
            fields.phones.first().map(Phone::as_str),
            fields.phones.second().map(Phone::as_str),
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn insert_patient(
    tx: &Transaction<'_>,
    person_id: PersonId,
    fields: &PatientFields,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO patient (person_id, sex, birth_date, deceased_at, race, weight_kg,
                              emergency_phone1, emergency_phone2)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            person_id,
            fields.sex.as_str(),
            fields.birth_date.to_stored(),
            fields.deceased_at.map(|d| d.to_stored()),
            fields.race.as_str(),
            fields.weight.kilograms(),
            fields.emergency_phones.first().map(Phone::as_str),
            fields.emergency_phones.second().map(Phone::as_str),
        ],
    )?;
    Ok(())
}
