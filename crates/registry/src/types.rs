//! Identifier and record types shared across the core operations.

use std::fmt;

use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};

use crate::domain::{
    Address, BiologicalSex, BirthDate, Cpf, DeathTimestamp, PersonName, PhonePair, RaceColor,
    Weight,
};
use crate::error::ValidationError;

/// Opaque 16-byte person key, generated by the store on insert.
///
/// Renders as 32 uppercase hexadecimal characters and parses back from the
/// same form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersonId([u8; 16]);

impl PersonId {
    /// Key width in bytes.
    pub const LEN: usize = 16;

    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        PersonId(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Parses the 32-character hexadecimal rendering.
    pub fn parse_hex(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.len() != 2 * Self::LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::MalformedPersonId);
        }
        let mut bytes = [0u8; Self::LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[2 * i..2 * i + 2], 16)
                .map_err(|_| ValidationError::MalformedPersonId)?;
        }
        Ok(PersonId(bytes))
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl ToSql for PersonId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&self.0)))
    }
}

impl FromSql for PersonId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let blob = value.as_blob()?;
        let bytes: [u8; Self::LEN] =
            blob.try_into()
                .map_err(|_| FromSqlError::InvalidBlobSize {
                    expected_size: Self::LEN,
                    blob_size: blob.len(),
                })?;
        Ok(PersonId(bytes))
    }
}

/// The validated person attributes collected before registration.
///
/// Every field already passed its domain constructor, so the persistence
/// path performs no revalidation.
#[derive(Debug, Clone)]
pub struct PersonFields {
    /// Unique national identifier.
    pub cpf: Cpf,
    /// Full name.
    pub name: PersonName,
    /// Complete address, or none at all.
    pub address: Option<Address>,
    /// Contact phones.
    pub phones: PhonePair,
}

/// The validated patient attributes collected before registration.
#[derive(Debug, Clone)]
pub struct PatientFields {
    /// Biological sex.
    pub sex: BiologicalSex,
    /// Birth date.
    pub birth_date: BirthDate,
    /// Death timestamp, when the patient is deceased.
    pub deceased_at: Option<DeathTimestamp>,
    /// Race/color category.
    pub race: RaceColor,
    /// Weight in kilograms.
    pub weight: Weight,
    /// Emergency contact phones.
    pub emergency_phones: PhonePair,
}

/// A person row returned by the search operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonRow {
    /// Store-generated key.
    pub id: PersonId,
    /// National identifier, formatted.
    pub cpf: String,
    /// Full name.
    pub name: String,
    /// Federative unit code, when an address was recorded.
    pub state: Option<String>,
    /// City, when an address was recorded.
    pub city: Option<String>,
    /// District, when an address was recorded.
    pub district: Option<String>,
    /// Street, when an address was recorded.
    pub street: Option<String>,
    /// House number, when an address was recorded.
    pub number: Option<u32>,
    /// First contact phone.
    pub phone1: Option<String>,
    /// Second contact phone.
    pub phone2: Option<String>,
}
