//! Validated domain value types.
//!
//! Every field rule is enforced by a fallible constructor, so holding a value
//! of one of these types is proof the rule holds. Constructors are total:
//! malformed input yields a [`ValidationError`], never a panic. Text values
//! are trimmed and uppercased on the way in, matching how rows are stored and
//! searched.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::error::ValidationError;

static CPF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").expect("valid CPF pattern"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{2}\)9\d{4}-\d{4}$").expect("valid phone pattern"));

/// The 27 federative unit codes.
const STATE_CODES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// A CPF in its canonical `XXX.XXX.XXX-XX` form, check digits verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf(String);

impl Cpf {
    /// Parses and verifies a CPF.
    ///
    /// The text must match the formatted pattern, and the two trailing digits
    /// must equal the mod-11 check digits recomputed from the first nine:
    /// digit 1 uses descending weights 10..2, digit 2 uses weights 11..2 over
    /// the first nine digits plus digit 1, both mapped to 0 when the raw
    /// check value is 10 or 11.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if !CPF_RE.is_match(s) {
            return Err(ValidationError::MalformedCpf);
        }

        let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();

        let sum: u32 = (0..9).map(|i| digits[i] * (10 - i as u32)).sum();
        let first = check_digit(sum);

        let sum: u32 = (0..9).map(|i| digits[i] * (11 - i as u32)).sum::<u32>() + first * 2;
        let second = check_digit(sum);

        if digits[9] != first || digits[10] != second {
            return Err(ValidationError::CpfCheckDigits);
        }

        Ok(Cpf(s.to_string()))
    }

    /// The canonical formatted text, as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check_digit(weighted_sum: u32) -> u32 {
    let check = 11 - weighted_sum % 11;
    if check >= 10 { 0 } else { check }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A person name: non-empty, at most 50 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    /// Trims, uppercases, and bounds-checks a name.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Ok(PersonName(bounded("name", s, 50)?))
    }

    /// The normalized name text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One of the 27 two-letter federative unit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCode(&'static str);

impl StateCode {
    /// Matches the trimmed, uppercased input against the fixed code set.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim().to_uppercase();
        STATE_CODES
            .iter()
            .find(|code| **code == s)
            .map(|code| StateCode(*code))
            .ok_or_else(|| ValidationError::UnknownState(s))
    }

    /// The two-letter code.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// A house number in `0..=99999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseNumber(u32);

impl HouseNumber {
    /// Largest representable house number.
    pub const MAX: u32 = 99_999;

    /// Bounds-checks an already-numeric value.
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::HouseNumberOutOfRange);
        }
        Ok(HouseNumber(value))
    }

    /// Parses the decimal rendering; signs and non-digits are rejected.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::HouseNumberOutOfRange);
        }
        let value: u32 = s
            .parse()
            .map_err(|_| ValidationError::HouseNumberOutOfRange)?;
        Self::new(value)
    }

    /// The numeric value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// A contact phone in the `(XX)9XXXX-XXXX` mobile format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phone(String);

impl Phone {
    /// Matches the fixed phone pattern.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if !PHONE_RE.is_match(s) {
            return Err(ValidationError::MalformedPhone);
        }
        Ok(Phone(s.to_string()))
    }

    /// The formatted phone text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Up to two phones, where a second phone requires a first.
///
/// This is the only way the crate holds a pair of phones, so the dependency
/// rule cannot be violated anywhere downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhonePair {
    first: Option<Phone>,
    second: Option<Phone>,
}

impl PhonePair {
    /// No phones at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a pair, rejecting a second phone without a first.
    pub fn try_new(first: Option<Phone>, second: Option<Phone>) -> Result<Self, ValidationError> {
        if first.is_none() && second.is_some() {
            return Err(ValidationError::SecondPhoneWithoutFirst);
        }
        Ok(Self { first, second })
    }

    /// The first phone, if any.
    pub fn first(&self) -> Option<&Phone> {
        self.first.as_ref()
    }

    /// The second phone, if any.
    pub fn second(&self) -> Option<&Phone> {
        self.second.as_ref()
    }
}

/// A complete residential address.
///
/// Every sub-field is required by construction; a person without a full
/// address carries no `Address` at all, which is how the all-or-nothing rule
/// stays enforced without call-site checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    state: StateCode,
    city: String,
    district: String,
    street: String,
    number: HouseNumber,
}

impl Address {
    /// Builds an address, bounds-checking the free-text sub-fields
    /// (city at most 50 characters, district and street at most 30).
    pub fn new(
        state: StateCode,
        city: &str,
        district: &str,
        street: &str,
        number: HouseNumber,
    ) -> Result<Self, ValidationError> {
        Ok(Address {
            state,
            city: bounded("city", city, 50)?,
            district: bounded("district", district, 30)?,
            street: bounded("street", street, 30)?,
            number,
        })
    }

    /// The federative unit code.
    pub fn state(&self) -> StateCode {
        self.state
    }

    /// The city name.
    pub fn city(&self) -> &str {
        &self.city
    }

    /// The district name.
    pub fn district(&self) -> &str {
        &self.district
    }

    /// The street name.
    pub fn street(&self) -> &str {
        &self.street
    }

    /// The house number.
    pub fn number(&self) -> HouseNumber {
        self.number
    }
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim().to_uppercase();
    if value.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value)
}

/// Biological sex as recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiologicalSex {
    /// Recorded as `M`.
    Male,
    /// Recorded as `F`.
    Female,
}

impl BiologicalSex {
    /// Accepts `M` or `F`, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_uppercase().as_str() {
            "M" => Ok(BiologicalSex::Male),
            "F" => Ok(BiologicalSex::Female),
            _ => Err(ValidationError::InvalidSex),
        }
    }

    /// The stored single-letter code.
    pub fn as_str(&self) -> &'static str {
        match self {
            BiologicalSex::Male => "M",
            BiologicalSex::Female => "F",
        }
    }
}

/// The five census race/color categories.
///
/// Variant names are the stored values.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceColor {
    Branco,
    Preto,
    Pardo,
    Amarelo,
    Indigena,
}

impl RaceColor {
    /// Matches the trimmed, uppercased input against the fixed category set.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_uppercase().as_str() {
            "BRANCO" => Ok(RaceColor::Branco),
            "PRETO" => Ok(RaceColor::Preto),
            "PARDO" => Ok(RaceColor::Pardo),
            "AMARELO" => Ok(RaceColor::Amarelo),
            "INDIGENA" => Ok(RaceColor::Indigena),
            other => Err(ValidationError::UnknownRaceColor(other.to_string())),
        }
    }

    /// The stored category text.
    pub fn as_str(&self) -> &'static str {
        match self {
            RaceColor::Branco => "BRANCO",
            RaceColor::Preto => "PRETO",
            RaceColor::Pardo => "PARDO",
            RaceColor::Amarelo => "AMARELO",
            RaceColor::Indigena => "INDIGENA",
        }
    }
}

/// A birth date no later than today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    /// Accepted input and stored rendering.
    pub const FORMAT: &'static str = "%Y-%m-%d";

    /// Parses a `YYYY-MM-DD` date, rejecting dates after the local today.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let date = NaiveDate::parse_from_str(s, Self::FORMAT)
            .map_err(|_| ValidationError::InvalidDate(s.to_string()))?;
        if date > Local::now().date_naive() {
            return Err(ValidationError::BirthInFuture);
        }
        Ok(BirthDate(date))
    }

    /// The calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The stored rendering.
    pub fn to_stored(&self) -> String {
        self.0.format(Self::FORMAT).to_string()
    }
}

/// A death timestamp, validated against the birth date and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeathTimestamp(NaiveDateTime);

impl DeathTimestamp {
    /// Accepted input and stored rendering.
    pub const FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Parses a `YYYY-MM-DD HH:MM:SS` timestamp, rejecting anything after
    /// the local now or before the birth date (taken at midnight).
    pub fn parse(s: &str, birth: BirthDate) -> Result<Self, ValidationError> {
        let s = s.trim();
        let at = NaiveDateTime::parse_from_str(s, Self::FORMAT)
            .map_err(|_| ValidationError::InvalidTimestamp(s.to_string()))?;
        if at > Local::now().naive_local() {
            return Err(ValidationError::DeathInFuture);
        }
        if at < birth.date().and_time(NaiveTime::MIN) {
            return Err(ValidationError::DeathBeforeBirth);
        }
        Ok(DeathTimestamp(at))
    }

    /// The timestamp.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }

    /// The stored rendering.
    pub fn to_stored(&self) -> String {
        self.0.format(Self::FORMAT).to_string()
    }
}

/// A weight in kilograms, strictly between 0 and 1000.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight(f64);

impl Weight {
    /// Parses a decimal weight, accepting `,` as the decimal separator.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().replace(',', ".");
        let value: f64 = normalized
            .parse()
            .map_err(|_| ValidationError::MalformedWeight(normalized.clone()))?;
        Self::new(value)
    }

    /// Bounds-checks an already-numeric weight.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if value.is_finite() && value > 0.0 && value < 1000.0 {
            Ok(Weight(value))
        } else {
            Err(ValidationError::WeightOutOfRange)
        }
    }

    /// The weight in kilograms.
    pub fn kilograms(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_accepts_valid_check_digits() {
        let cpf = Cpf::parse("529.982.247-25").unwrap();
        assert_eq!(cpf.as_str(), "529.982.247-25");
        assert!(Cpf::parse("111.444.777-35").is_ok());
        assert!(Cpf::parse("123.456.789-09").is_ok());
    }

    #[test]
    fn cpf_rejects_wrong_check_digits() {
        assert_eq!(
            Cpf::parse("529.982.247-24"),
            Err(ValidationError::CpfCheckDigits)
        );
        assert_eq!(
            Cpf::parse("123.456.789-00"),
            Err(ValidationError::CpfCheckDigits)
        );
    }

    #[test]
    fn cpf_rejects_malformed_text() {
        for input in ["52998224725", "529.982.247-2", "529.982.24a-25", ""] {
            assert_eq!(Cpf::parse(input), Err(ValidationError::MalformedCpf));
        }
    }

    #[test]
    fn phone_pattern() {
        assert!(Phone::parse("(11)98765-4321").is_ok());
        for input in ["(1)98765-4321", "(11)8765-4321", "11987654321"] {
            assert_eq!(Phone::parse(input), Err(ValidationError::MalformedPhone));
        }
    }

    #[test]
    fn phone_pair_second_requires_first() {
        let phone = Phone::parse("(11)98765-4321").unwrap();
        assert!(PhonePair::try_new(Some(phone.clone()), Some(phone.clone())).is_ok());
        assert!(PhonePair::try_new(Some(phone.clone()), None).is_ok());
        assert!(PhonePair::try_new(None, None).is_ok());
        assert_eq!(
            PhonePair::try_new(None, Some(phone)),
            Err(ValidationError::SecondPhoneWithoutFirst)
        );
    }

    #[test]
    fn name_bounds() {
        assert_eq!(PersonName::parse("Ana").unwrap().as_str(), "ANA");
        assert_eq!(
            PersonName::parse("   "),
            Err(ValidationError::EmptyField { field: "name" })
        );
        assert_eq!(
            PersonName::parse(&"a".repeat(51)),
            Err(ValidationError::TooLong {
                field: "name",
                max: 50
            })
        );
        assert!(PersonName::parse(&"a".repeat(50)).is_ok());
    }

    #[test]
    fn state_code_membership() {
        assert_eq!(StateCode::parse("sp").unwrap().as_str(), "SP");
        assert_eq!(StateCode::parse("TO").unwrap().as_str(), "TO");
        assert_eq!(
            StateCode::parse("XX"),
            Err(ValidationError::UnknownState("XX".to_string()))
        );
    }

    #[test]
    fn house_number_bounds() {
        assert_eq!(HouseNumber::parse("0").unwrap().value(), 0);
        assert_eq!(HouseNumber::parse("99999").unwrap().value(), 99_999);
        for input in ["100000", "-1", "12a", ""] {
            assert_eq!(
                HouseNumber::parse(input),
                Err(ValidationError::HouseNumberOutOfRange)
            );
        }
    }

    #[test]
    fn address_requires_every_field() {
        let state = StateCode::parse("SP").unwrap();
        let number = HouseNumber::new(42).unwrap();
        let address = Address::new(state, "Sao Paulo", "Centro", "Rua A", number).unwrap();
        assert_eq!(address.city(), "SAO PAULO");
        assert_eq!(
            Address::new(state, "", "Centro", "Rua A", number),
            Err(ValidationError::EmptyField { field: "city" })
        );
        assert_eq!(
            Address::new(state, "Sao Paulo", &"b".repeat(31), "Rua A", number),
            Err(ValidationError::TooLong {
                field: "district",
                max: 30
            })
        );
        assert_eq!(
            Address::new(state, "Sao Paulo", "Centro", &"r".repeat(31), number),
            Err(ValidationError::TooLong {
                field: "street",
                max: 30
            })
        );
    }

    #[test]
    fn sex_codes() {
        assert_eq!(BiologicalSex::parse("m").unwrap(), BiologicalSex::Male);
        assert_eq!(BiologicalSex::parse("F").unwrap(), BiologicalSex::Female);
        assert_eq!(BiologicalSex::parse("X"), Err(ValidationError::InvalidSex));
    }

    #[test]
    fn race_color_membership() {
        assert_eq!(RaceColor::parse("pardo").unwrap(), RaceColor::Pardo);
        assert_eq!(RaceColor::parse("INDIGENA").unwrap(), RaceColor::Indigena);
        assert_eq!(
            RaceColor::parse("AZUL"),
            Err(ValidationError::UnknownRaceColor("AZUL".to_string()))
        );
    }

    #[test]
    fn birth_date_not_in_future() {
        assert!(BirthDate::parse("1990-04-12").is_ok());
        assert_eq!(
            BirthDate::parse("9999-01-01"),
            Err(ValidationError::BirthInFuture)
        );
        assert_eq!(
            BirthDate::parse("1990-13-40"),
            Err(ValidationError::InvalidDate("1990-13-40".to_string()))
        );
    }

    #[test]
    fn death_timestamp_ordering() {
        let birth = BirthDate::parse("1990-04-12").unwrap();
        assert!(DeathTimestamp::parse("2020-05-10 14:30:00", birth).is_ok());
        // Equal to the birth midnight is allowed.
        assert!(DeathTimestamp::parse("1990-04-12 00:00:00", birth).is_ok());
        assert_eq!(
            DeathTimestamp::parse("1990-04-11 23:59:59", birth),
            Err(ValidationError::DeathBeforeBirth)
        );
        assert_eq!(
            DeathTimestamp::parse("9999-01-01 00:00:00", birth),
            Err(ValidationError::DeathInFuture)
        );
        assert_eq!(
            DeathTimestamp::parse("2020-05-10", birth),
            Err(ValidationError::InvalidTimestamp("2020-05-10".to_string()))
        );
    }

    #[test]
    fn weight_bounds_and_comma() {
        assert_eq!(Weight::parse("72,5").unwrap().kilograms(), 72.5);
        assert_eq!(Weight::parse("72.5").unwrap().kilograms(), 72.5);
        assert_eq!(Weight::parse("0"), Err(ValidationError::WeightOutOfRange));
        assert_eq!(
            Weight::parse("1000"),
            Err(ValidationError::WeightOutOfRange)
        );
        assert_eq!(
            Weight::parse("abc"),
            Err(ValidationError::MalformedWeight("abc".to_string()))
        );
        assert!(Weight::parse("999,9").is_ok());
    }
}
