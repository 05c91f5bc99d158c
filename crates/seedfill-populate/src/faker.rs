use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use fake::Fake;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Locales the fake-value source can speak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locale {
    En,
    PtBr,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "en" | "en_US" => Some(Self::En),
            "pt_BR" => Some(Self::PtBr),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en_US",
            Self::PtBr => "pt_BR",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! localized {
    ($self:ident, $module:ident::$faker:ident($($arg:expr),*)) => {
        match $self.locale {
            Locale::En => fake::faker::$module::en::$faker($($arg),*)
                .fake_with_rng::<String, _>(&mut $self.rng),
            Locale::PtBr => fake::faker::$module::pt_br::$faker($($arg),*)
                .fake_with_rng::<String, _>(&mut $self.rng),
        }
    };
}

/// Random fake-value source: named operations over one locale and one RNG.
///
/// The RNG is seeded once at construction; pass the same seed to `seeded`
/// for reproducible runs. None of the operations know anything about the
/// populator's inserted-identity index.
pub struct FakeSource {
    locale: Locale,
    rng: ChaCha8Rng,
}

impl FakeSource {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    pub fn seeded(locale: Locale, seed: u64) -> Self {
        Self {
            locale,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Direct RNG access for callers that need shuffles or raw draws.
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn boolean(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    pub fn random_int(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    /// Index uniformly drawn from `0..len`; `len` must be non-zero.
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    /// Non-negative number with up to `left_digits` before the point and
    /// exactly `right_digits` after it.
    pub fn decimal(&mut self, left_digits: u8, right_digits: u8) -> f64 {
        let left_digits = left_digits.min(15) as u32;
        let right_digits = right_digits.min(9) as u32;
        let whole = if left_digits == 0 {
            0
        } else {
            self.rng.random_range(0..10_i64.pow(left_digits))
        };
        let scale = 10_i64.pow(right_digits);
        let fraction = if right_digits == 0 {
            0
        } else {
            self.rng.random_range(0..scale)
        };
        whole as f64 + fraction as f64 / scale as f64
    }

    pub fn word(&mut self) -> String {
        localized!(self, lorem::Word())
    }

    pub fn sentence(&mut self) -> String {
        localized!(self, lorem::Sentence(3..8))
    }

    pub fn paragraph(&mut self) -> String {
        localized!(self, lorem::Paragraph(3..6))
    }

    /// Lorem text truncated to `max_length` characters.
    pub fn text(&mut self, max_length: u32) -> String {
        let mut text = self.paragraph();
        if text.len() > max_length as usize {
            let mut cut = max_length as usize;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        text
    }

    pub fn first_name(&mut self) -> String {
        localized!(self, name::FirstName())
    }

    pub fn last_name(&mut self) -> String {
        localized!(self, name::LastName())
    }

    pub fn user_name(&mut self) -> String {
        localized!(self, internet::Username())
    }

    pub fn email(&mut self) -> String {
        localized!(self, internet::SafeEmail())
    }

    pub fn phone_number(&mut self) -> String {
        localized!(self, phone_number::PhoneNumber())
    }

    pub fn street_address(&mut self) -> String {
        let number = localized!(self, address::BuildingNumber());
        let street = localized!(self, address::StreetName());
        format!("{number} {street}")
    }

    pub fn address(&mut self) -> String {
        let street = self.street_address();
        let city = self.city();
        let postcode = self.postcode();
        format!("{street}, {city} {postcode}")
    }

    pub fn city(&mut self) -> String {
        localized!(self, address::CityName())
    }

    pub fn postcode(&mut self) -> String {
        localized!(self, address::PostCode())
    }

    pub fn state_abbr(&mut self) -> String {
        localized!(self, address::StateAbbr())
    }

    pub fn country(&mut self) -> String {
        localized!(self, address::CountryName())
    }

    pub fn slug(&mut self) -> String {
        let first = self.word().to_lowercase();
        let second = self.word().to_lowercase();
        format!("{first}-{second}-{}", self.rng.random_range(1..=9999))
    }

    pub fn uri(&mut self) -> String {
        let slug = self.slug();
        format!("https://example.com/{slug}")
    }

    pub fn uuid4(&mut self) -> String {
        let mut bytes = [0_u8; 16];
        self.rng.fill_bytes(&mut bytes);
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        uuid::Uuid::from_bytes(bytes).to_string()
    }

    pub fn binary(&mut self, length: usize) -> Vec<u8> {
        let mut bytes = vec![0_u8; length];
        self.rng.fill_bytes(&mut bytes);
        bytes
    }

    pub fn date(&mut self) -> NaiveDate {
        self.date_time().date_naive()
    }

    pub fn date_time(&mut self) -> DateTime<Utc> {
        // Uniform over 1970..~2030.
        let seconds = self.rng.random_range(0..=1_900_000_000_i64);
        Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
    }

    pub fn time(&mut self) -> NaiveTime {
        let seconds = self.rng.random_range(0..86_400_u32);
        NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default()
    }

    /// Elapsed seconds, up to about a year.
    pub fn time_delta(&mut self) -> i64 {
        self.rng.random_range(0..=31_536_000)
    }

    pub fn ipv4(&mut self) -> String {
        localized!(self, internet::IPv4())
    }

    pub fn ipv6(&mut self) -> String {
        localized!(self, internet::IPv6())
    }
}

impl fmt::Debug for FakeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeSource")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}
