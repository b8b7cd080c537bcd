//! Gas mix text: parsing what divers type and labelling what the list shows.
//!
//! Accepted forms (case-insensitive, percentages may carry decimals):
//!
//! - `air`, `oxygen` / `o2`
//! - nitrox: `EAN32`, `EANx 32`, `nitrox 36`, `nx32`, `32%`, `32`
//! - trimix: `21/35`, `tx18/45`, `trimix 10/70`

use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, value},
    number::complete::double,
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult, Parser,
};

use crate::error::{Error, Result};
use crate::models::GasMix;
use crate::stats::GasClass;

/// Parse a gas mix description into permille fractions.
pub fn parse_gas_mix(input: &str) -> Result<GasMix> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::EmptyGas);
    }

    let (_, mix) = all_consuming(gas_mix).parse(input).map_err(|e| {
        let position = match &e {
            nom::Err::Error(err) | nom::Err::Failure(err) => input.len() - err.input.len(),
            nom::Err::Incomplete(_) => input.len(),
        };
        Error::GasParse {
            position,
            message: format!("cannot read a gas mix from '{input}'"),
        }
    })?;

    validate(mix)
}

fn validate(mix: GasMix) -> Result<GasMix> {
    let valid = (1..=1000).contains(&mix.o2_permille)
        && (0..=1000).contains(&mix.he_permille)
        && mix.o2_permille + mix.he_permille <= 1000;
    if valid {
        Ok(mix)
    } else {
        Err(Error::InvalidGasMix {
            o2_permille: mix.o2_permille,
            he_permille: mix.he_permille,
        })
    }
}

fn gas_mix(input: &str) -> IResult<&str, GasMix> {
    delimited(multispace0, alt((named, nitrox, trimix, plain)), multispace0).parse(input)
}

/// A percentage, returned in permille.
fn percent(input: &str) -> IResult<&str, i32> {
    map(terminated(double, opt(char('%'))), |p: f64| (p * 10.0).round() as i32).parse(input)
}

fn named(input: &str) -> IResult<&str, GasMix> {
    alt((
        value(GasMix::AIR, tag_no_case("air")),
        value(
            GasMix::new(1000, 0),
            alt((tag_no_case("oxygen"), tag_no_case("o2"))),
        ),
    ))
    .parse(input)
}

fn nitrox(input: &str) -> IResult<&str, GasMix> {
    let prefix = alt((
        tag_no_case("eanx"),
        tag_no_case("ean"),
        tag_no_case("nitrox"),
        tag_no_case("nx"),
    ));
    map(preceded((prefix, multispace0), percent), |o2| {
        GasMix::new(o2, 0)
    })
    .parse(input)
}

fn trimix(input: &str) -> IResult<&str, GasMix> {
    let prefix = opt((
        alt((tag_no_case("trimix"), tag_no_case("tx"))),
        multispace0,
    ));
    let slash = delimited(multispace0, char('/'), multispace0);
    map(
        preceded(prefix, separated_pair(percent, slash, percent)),
        |(o2, he)| GasMix::new(o2, he),
    )
    .parse(input)
}

fn plain(input: &str) -> IResult<&str, GasMix> {
    map(percent, |o2| GasMix::new(o2, 0)).parse(input)
}

impl FromStr for GasMix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_gas_mix(s)
    }
}

/// Permille to whole percent, rounded.
fn pct(permille: i32) -> i32 {
    (permille + 5) / 10
}

impl GasMix {
    /// Short name that [`parse_gas_mix`] reads back.
    pub fn label(&self) -> String {
        if self.is_air() {
            "air".to_string()
        } else if self.he_permille > 0 {
            format!("{}/{}", pct(self.o2()), pct(self.he_permille))
        } else if self.o2() == 1000 {
            "oxygen".to_string()
        } else {
            format!("EAN{}", pct(self.o2()))
        }
    }
}

impl GasClass {
    /// Dive list text: `air`, `32`, `28…32` for a nitrox range, `21/35`.
    pub fn label(&self) -> String {
        let o2 = pct(self.o2_permille);
        let he = pct(self.he_permille);
        let o2_low = pct(self.o2_low_permille);

        if he != 0 {
            format!("{o2}/{he}")
        } else if o2 == 0 {
            "air".to_string()
        } else if o2 == o2_low {
            format!("{o2}")
        } else {
            format!("{o2_low}\u{2026}{o2}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named() {
        assert_eq!(parse_gas_mix("air").unwrap(), GasMix::AIR);
        assert_eq!(parse_gas_mix(" AIR ").unwrap(), GasMix::AIR);
        assert_eq!(parse_gas_mix("Oxygen").unwrap(), GasMix::new(1000, 0));
        assert_eq!(parse_gas_mix("o2").unwrap(), GasMix::new(1000, 0));
    }

    #[test]
    fn test_parse_nitrox() {
        assert_eq!(parse_gas_mix("EAN32").unwrap(), GasMix::new(320, 0));
        assert_eq!(parse_gas_mix("eanx 36").unwrap(), GasMix::new(360, 0));
        assert_eq!(parse_gas_mix("nitrox 50%").unwrap(), GasMix::new(500, 0));
        assert_eq!(parse_gas_mix("32%").unwrap(), GasMix::new(320, 0));
        assert_eq!(parse_gas_mix("20.9").unwrap(), GasMix::new(209, 0));
    }

    #[test]
    fn test_parse_trimix() {
        assert_eq!(parse_gas_mix("21/35").unwrap(), GasMix::new(210, 350));
        assert_eq!(parse_gas_mix("tx18/45").unwrap(), GasMix::new(180, 450));
        assert_eq!(
            parse_gas_mix("Trimix 10 / 70").unwrap(),
            GasMix::new(100, 700)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_gas_mix(""), Err(Error::EmptyGas)));
        assert!(matches!(parse_gas_mix("   "), Err(Error::EmptyGas)));
        assert!(matches!(
            parse_gas_mix("heliox"),
            Err(Error::GasParse { .. })
        ));
        assert!(matches!(
            parse_gas_mix("EAN32 please"),
            Err(Error::GasParse { .. })
        ));
        assert!(matches!(
            parse_gas_mix("80/40"),
            Err(Error::InvalidGasMix { .. })
        ));
        assert!(matches!(
            parse_gas_mix("0"),
            Err(Error::InvalidGasMix { .. })
        ));
    }

    #[test]
    fn test_from_str() {
        let mix: GasMix = "EAN28".parse().unwrap();
        assert_eq!(mix.o2_permille, 280);
    }

    #[test]
    fn test_mix_label_reads_back() {
        for text in ["air", "oxygen", "EAN32", "21/35"] {
            let mix = parse_gas_mix(text).unwrap();
            assert_eq!(mix.label(), text);
        }
        // unset counts as air
        assert_eq!(GasMix::default().label(), "air");
    }

    #[test]
    fn test_class_label() {
        assert_eq!(GasClass::AIR.label(), "air");
        let ean = GasClass {
            o2_permille: 320,
            he_permille: 0,
            o2_low_permille: 320,
        };
        assert_eq!(ean.label(), "32");
        let range = GasClass {
            o2_permille: 320,
            he_permille: 0,
            o2_low_permille: 280,
        };
        assert_eq!(range.label(), "28\u{2026}32");
        let tx = GasClass {
            o2_permille: 180,
            he_permille: 450,
            o2_low_permille: 180,
        };
        assert_eq!(tx.label(), "18/45");
    }
}
