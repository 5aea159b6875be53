use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Non-negative rational used for plan timestamps and action durations.
///
/// Always stored in lowest terms so that derived equality and hashing agree
/// with numeric equality (`2/4 == 1/2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RationalRepr", into = "RationalRepr")]
pub struct Rational {
    numer: u64,
    denom: u64,
}

impl Rational {
    pub const ZERO: Self = Self { numer: 0, denom: 1 };

    pub fn new(numer: u64, denom: u64) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        let divisor = gcd(numer, denom);
        Some(Self {
            numer: numer / divisor,
            denom: denom / divisor,
        })
    }

    pub fn from_integer(value: u64) -> Self {
        Self {
            numer: value,
            denom: 1,
        }
    }

    pub fn numer(self) -> u64 {
        self.numer
    }

    pub fn denom(self) -> u64 {
        self.denom
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.numer as f64 / self.denom as f64
    }

    /// Interprets the rational as seconds.
    pub fn as_duration(self) -> Duration {
        Duration::from_secs_f64(self.as_f64())
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.numer) * u128::from(other.denom);
        let rhs = u128::from(other.numer) * u128::from(self.denom);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.numer)
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

impl FromStr for Rational {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Some((numer, denom)) = text.split_once('/') {
            let numer = parse_part(numer, text)?;
            let denom = parse_part(denom, text)?;
            return Self::new(numer, denom).ok_or_else(|| format!("zero denominator in {text}"));
        }

        if let Some((whole, fraction)) = text.split_once('.') {
            if fraction.is_empty() || fraction.len() > 18 {
                return Err(format!("invalid rational: {text}"));
            }
            let scale = 10_u64.pow(u32::try_from(fraction.len()).unwrap_or(18));
            let whole = if whole.is_empty() {
                0
            } else {
                parse_part(whole, text)?
            };
            let fraction = parse_part(fraction, text)?;
            let numer = whole
                .checked_mul(scale)
                .and_then(|value| value.checked_add(fraction))
                .ok_or_else(|| format!("rational out of range: {text}"))?;
            return Self::new(numer, scale).ok_or_else(|| format!("invalid rational: {text}"));
        }

        parse_part(text, text).map(Self::from_integer)
    }
}

fn parse_part(part: &str, whole: &str) -> Result<u64, String> {
    part.trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid rational: {whole}"))
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let rem = a % b;
        a = b;
        b = rem;
    }
    a.max(1)
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RationalRepr {
    Integer(u64),
    Text(String),
    Parts { numer: u64, denom: u64 },
}

impl TryFrom<RationalRepr> for Rational {
    type Error = String;

    fn try_from(repr: RationalRepr) -> Result<Self, Self::Error> {
        match repr {
            RationalRepr::Integer(value) => Ok(Self::from_integer(value)),
            RationalRepr::Text(text) => text.parse(),
            RationalRepr::Parts { numer, denom } => {
                Self::new(numer, denom).ok_or_else(|| format!("zero denominator in {numer}/{denom}"))
            }
        }
    }
}

impl From<Rational> for RationalRepr {
    fn from(value: Rational) -> Self {
        if value.denom == 1 {
            Self::Integer(value.numer)
        } else {
            Self::Text(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reduces_to_lowest_terms() {
        let half = Rational::new(2, 4).unwrap();
        assert_eq!(half, Rational::new(1, 2).unwrap());
        assert_eq!(half.numer(), 1);
        assert_eq!(half.denom(), 2);
    }

    #[test]
    fn new_rejects_zero_denominator() {
        assert!(Rational::new(3, 0).is_none());
    }

    #[test]
    fn ordering_is_numeric() {
        let third = Rational::new(1, 3).unwrap();
        let half = Rational::new(1, 2).unwrap();
        assert!(third < half);
        assert!(Rational::from_integer(2) > half);
    }

    #[test]
    fn parses_fraction_decimal_and_integer() {
        assert_eq!("3/2".parse::<Rational>().unwrap(), Rational::new(3, 2).unwrap());
        assert_eq!("2.5".parse::<Rational>().unwrap(), Rational::new(5, 2).unwrap());
        assert_eq!("7".parse::<Rational>().unwrap(), Rational::from_integer(7));
        assert!("x/2".parse::<Rational>().is_err());
    }

    #[test]
    fn deserializes_all_representations() {
        let parsed: Vec<Rational> =
            serde_json::from_str(r#"[5, "3/2", {"numer": 6, "denom": 4}]"#).unwrap();
        assert_eq!(parsed[0], Rational::from_integer(5));
        assert_eq!(parsed[1], Rational::new(3, 2).unwrap());
        assert_eq!(parsed[2], Rational::new(3, 2).unwrap());
    }

    #[test]
    fn display_omits_unit_denominator() {
        assert_eq!(Rational::from_integer(5).to_string(), "5");
        assert_eq!(Rational::new(3, 2).unwrap().to_string(), "3/2");
    }
}
