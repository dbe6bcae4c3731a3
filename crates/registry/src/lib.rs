//! Person and patient registration core.
//!
//! This crate registers and searches two linked entity types, a generic
//! person and its patient specialization, in a SQLite store, enforcing the
//! domain validation rules and preventing duplicate or inconsistent
//! registration. The interactive shell (prompting, table rendering) is the
//! caller's business: the crate receives already-collected field values and
//! hands back validation verdicts, resolution states, or result rows.
//!
//! # Architecture
//!
//! - [`domain`] - validated value types; each field rule is a fallible
//!   constructor, so invalid combinations are unrepresentable downstream
//! - [`error`] - error taxonomy (validation failures, store faults)
//! - [`store`] - pooled SQLite store and schema
//! - [`resolve`] - registration-status resolution for a CPF
//! - [`search`] - conjunctive optional-predicate search over persons
//! - [`register`] - two-table transactional registration
//!
//! # Quick start
//!
//! ```no_run
//! use vitalis_registry::domain::{
//!     BiologicalSex, BirthDate, Cpf, PersonName, PhonePair, RaceColor, Weight,
//! };
//! use vitalis_registry::{
//!     PatientFields, PersonFields, RegisterOutcome, RegistryError, SqliteStore,
//! };
//!
//! fn main() -> Result<(), RegistryError> {
//!     let store = SqliteStore::in_memory()?;
//!     store.init_schema()?;
//!
//!     let person = PersonFields {
//!         cpf: Cpf::parse("529.982.247-25")?,
//!         name: PersonName::parse("Ana Souza")?,
//!         address: None,
//!         phones: PhonePair::none(),
//!     };
//!     let patient = PatientFields {
//!         sex: BiologicalSex::parse("F")?,
//!         birth_date: BirthDate::parse("1990-04-12")?,
//!         deceased_at: None,
//!         race: RaceColor::parse("PARDO")?,
//!         weight: Weight::parse("72,5")?,
//!         emergency_phones: PhonePair::none(),
//!     };
//!
//!     let resolution = store.resolve(&person.cpf)?;
//!     match store.register_patient(resolution, Some(&person), &patient)? {
//!         RegisterOutcome::Registered(id) => println!("registered as {id}"),
//!         RegisterOutcome::Aborted => println!("already a patient"),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod domain;
pub mod error;
pub mod register;
pub mod resolve;
pub mod search;
pub mod store;
pub mod types;

pub use error::{RegistryError, RegistryResult, StoreError, StoreResult, ValidationError};
pub use register::RegisterOutcome;
pub use resolve::Resolution;
pub use search::{PersonFilter, SqlFragment, SqlParam, build_person_search};
pub use store::{SqliteStore, SqliteStoreConfig};
pub use types::{PatientFields, PersonFields, PersonId, PersonRow};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
