//! Conjunctive optional-predicate search over persons.
//!
//! Every searchable column contributes a `(?N IS NULL OR column <op> ?N)`
//! clause with one bound parameter referenced twice. An absent filter binds
//! NULL and its clause degenerates to true, so zero filters scan the whole
//! table and each provided filter can only narrow the result set. Values are
//! always bound, never interpolated into the statement text.

use rusqlite::ToSql;
use rusqlite::types::{Null, ToSqlOutput};

use crate::error::StoreResult;
use crate::store::SqliteStore;
use crate::types::{PersonId, PersonRow};

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Binary value.
    Blob(Vec<u8>),
    /// Absent value.
    Null,
}

impl SqlParam {
    fn text(value: Option<&String>) -> Self {
        match value {
            Some(s) => SqlParam::Text(s.clone()),
            None => SqlParam::Null,
        }
    }

    /// Whether this parameter binds NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlParam::Null)
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlParam::Text(s) => s.to_sql(),
            SqlParam::Integer(i) => i.to_sql(),
            SqlParam::Blob(b) => b.to_sql(),
            SqlParam::Null => Null.to_sql(),
        }
    }
}

/// A SQL statement with its bound parameters.
#[derive(Debug, Clone)]
pub struct SqlFragment {
    sql: String,
    params: Vec<SqlParam>,
}

impl SqlFragment {
    /// Binds `param` and returns its `?N` placeholder.
    fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// The statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameters, in placeholder order.
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

/// Optional filters over every searchable person column.
///
/// An unset field contributes no predicate. Text filters are trimmed and
/// uppercased the way rows are stored, so exact matching behaves the same as
/// at registration time.
#[derive(Debug, Clone, Default)]
pub struct PersonFilter {
    id: Option<PersonId>,
    cpf: Option<String>,
    name: Option<String>,
    state: Option<String>,
    city: Option<String>,
    district: Option<String>,
    street: Option<String>,
    number: Option<u32>,
    phone1: Option<String>,
    phone2: Option<String>,
}

impl PersonFilter {
    /// No filters; matches every person.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters on the exact person key.
    pub fn with_id(mut self, id: PersonId) -> Self {
        self.id = Some(id);
        self
    }

    /// Filters on the exact formatted CPF.
    pub fn with_cpf(mut self, cpf: &str) -> Self {
        self.cpf = Some(cpf.trim().to_string());
        self
    }

    /// Filters on a name substring.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.trim().to_uppercase());
        self
    }

    /// Filters on the exact state code.
    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.trim().to_uppercase());
        self
    }

    /// Filters on the exact city.
    pub fn with_city(mut self, city: &str) -> Self {
        self.city = Some(city.trim().to_uppercase());
        self
    }

    /// Filters on the exact district.
    pub fn with_district(mut self, district: &str) -> Self {
        self.district = Some(district.trim().to_uppercase());
        self
    }

    /// Filters on the exact street.
    pub fn with_street(mut self, street: &str) -> Self {
        self.street = Some(street.trim().to_uppercase());
        self
    }

    /// Filters on the exact house number.
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    /// Parses a raw house-number filter, discarding unparsable input.
    ///
    /// The search still runs, unfiltered on this column.
    pub fn with_number_str(mut self, raw: &str) -> Self {
        match raw.trim().parse::<u32>() {
            Ok(number) => self.number = Some(number),
            Err(_) => {
                tracing::warn!(raw, "discarding unparsable house-number filter");
                self.number = None;
            }
        }
        self
    }

    /// Filters on the exact first phone.
    pub fn with_phone1(mut self, phone: &str) -> Self {
        self.phone1 = Some(phone.trim().to_string());
        self
    }

    /// Filters on the exact second phone.
    pub fn with_phone2(mut self, phone: &str) -> Self {
        self.phone2 = Some(phone.trim().to_string());
        self
    }

    /// True when no column is filtered.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.cpf.is_none()
            && self.name.is_none()
            && self.state.is_none()
            && self.city.is_none()
            && self.district.is_none()
            && self.street.is_none()
            && self.number.is_none()
            && self.phone1.is_none()
            && self.phone2.is_none()
    }
}

const SELECT_COLUMNS: &str = "id, cpf, name, state, city, district, street, number, phone1, phone2";

/// Composes the parametrized search statement for `filter`.
///
/// The parameter list always has one entry per searchable column, bound
/// NULL where the filter is absent.
pub fn build_person_search(filter: &PersonFilter) -> SqlFragment {
    let mut fragment = SqlFragment {
        sql: String::new(),
        params: Vec::with_capacity(10),
    };

    let clauses = [
        exact(
            &mut fragment,
            "id",
            match &filter.id {
                Some(id) => SqlParam::Blob(id.as_bytes().to_vec()),
                None => SqlParam::Null,
            },
        ),
        exact(&mut fragment, "cpf", SqlParam::text(filter.cpf.as_ref())),
        contains(&mut fragment, "name", SqlParam::text(filter.name.as_ref())),
        exact(&mut fragment, "state", SqlParam::text(filter.state.as_ref())),
        exact(&mut fragment, "city", SqlParam::text(filter.city.as_ref())),
        exact(
            &mut fragment,
            "district",
            SqlParam::text(filter.district.as_ref()),
        ),
        exact(
            &mut fragment,
            "street",
            SqlParam::text(filter.street.as_ref()),
        ),
        exact(
            &mut fragment,
            "number",
            match filter.number {
                Some(number) => SqlParam::Integer(i64::from(number)),
                None => SqlParam::Null,
            },
        ),
        exact(
            &mut fragment,
            "phone1",
            SqlParam::text(filter.phone1.as_ref()),
        ),
        exact(
            &mut fragment,
            "phone2",
            SqlParam::text(filter.phone2.as_ref()),
        ),
    ];

    fragment.sql = format!(
        "SELECT {SELECT_COLUMNS} FROM person WHERE {}",
        clauses.join(" AND ")
    );

    tracing::debug!(sql = fragment.sql.as_str(), "composed person search");
    fragment
}

fn exact(fragment: &mut SqlFragment, column: &str, param: SqlParam) -> String {
    let p = fragment.add_param(param);
    format!("({p} IS NULL OR {column} = {p})")
}

fn contains(fragment: &mut SqlFragment, column: &str, param: SqlParam) -> String {
    let p = fragment.add_param(param);
    format!("({p} IS NULL OR {column} LIKE '%' || {p} || '%')")
}

impl SqliteStore {
    /// Runs the composed search and maps the matching person rows.
    pub fn search_persons(&self, filter: &PersonFilter) -> StoreResult<Vec<PersonRow>> {
        let fragment = build_person_search(filter);
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(fragment.sql())?;
        let rows = stmt.query_map(rusqlite::params_from_iter(fragment.params()), |row| {
            Ok(PersonRow {
                id: row.get(0)?,
                cpf: row.get(1)?,
                name: row.get(2)?,
                state: row.get(3)?,
                city: row.get(4)?,
                district: row.get(5)?,
                street: row.get(6)?,
                number: row.get(7)?,
                phone1: row.get(8)?,
                phone2: row.get(9)?,
            })
        })?;

        let mut matches = Vec::new();
        for row in rows {
            matches.push(row?);
        }

        tracing::debug!(matches = matches.len(), "person search complete");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_binds_ten_nulls() {
        let fragment = build_person_search(&PersonFilter::new());
        assert_eq!(fragment.params().len(), 10);
        assert!(fragment.params().iter().all(SqlParam::is_null));
        assert!(fragment.sql().starts_with("SELECT id, cpf, name"));
    }

    #[test]
    fn name_clause_uses_substring_matching() {
        let fragment = build_person_search(&PersonFilter::new().with_name("ana"));
        assert!(
            fragment
                .sql()
                .contains("(?3 IS NULL OR name LIKE '%' || ?3 || '%')")
        );
        assert_eq!(fragment.params()[2], SqlParam::Text("ANA".to_string()));
    }

    #[test]
    fn other_clauses_use_equality() {
        let fragment = build_person_search(&PersonFilter::new().with_state("sp").with_number(42));
        assert!(fragment.sql().contains("(?4 IS NULL OR state = ?4)"));
        assert!(fragment.sql().contains("(?8 IS NULL OR number = ?8)"));
        assert_eq!(fragment.params()[3], SqlParam::Text("SP".to_string()));
        assert_eq!(fragment.params()[7], SqlParam::Integer(42));
    }

    #[test]
    fn unparsable_number_filter_is_discarded() {
        let filter = PersonFilter::new().with_number_str("12b");
        assert!(filter.is_empty());

        let filter = PersonFilter::new().with_number_str("123");
        assert!(!filter.is_empty());
    }

    #[test]
    fn id_filter_binds_key_bytes() {
        let id = PersonId::from_bytes([0xAB; 16]);
        let fragment = build_person_search(&PersonFilter::new().with_id(id));
        assert_eq!(fragment.params()[0], SqlParam::Blob(vec![0xAB; 16]));
    }
}
