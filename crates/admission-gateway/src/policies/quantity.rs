use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    // <signedNumber><suffix>, see k8s.io/apimachinery/pkg/api/resource
    static ref QUANTITY: Regex = Regex::new(
        r"^[+-]?(?P<int>[0-9]*)(?:\.(?P<frac>[0-9]*))?(?:Ki|Mi|Gi|Ti|Pi|Ei|n|u|m|k|M|G|T|P|E|[eE][+-]?[0-9]+)?$"
    )
    .expect("quantity regex is valid");
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("quantity {0:?} does not match the expected format")]
    InvalidFormat(String),
}

/// Returns whether a resource quantity amounts to zero.
///
/// The multiplier expressed by the suffix is always positive, hence only the
/// digits of the number matter.
pub fn is_zero(quantity: &Quantity) -> Result<bool, QuantityError> {
    let value = quantity.0.trim();
    if value.is_empty() {
        return Err(QuantityError::Empty);
    }

    let captures = QUANTITY
        .captures(value)
        .ok_or_else(|| QuantityError::InvalidFormat(value.to_owned()))?;
    let digits: String = ["int", "frac"]
        .iter()
        .filter_map(|group| captures.name(group))
        .map(|m| m.as_str())
        .collect();

    if digits.is_empty() {
        return Err(QuantityError::InvalidFormat(value.to_owned()));
    }

    Ok(digits.chars().all(|c| c == '0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case::zero("0", true)]
    #[case::zero_milli("0m", true)]
    #[case::zero_binary("0Mi", true)]
    #[case::zero_decimal("0.000", true)]
    #[case::zero_exponent("0e3", true)]
    #[case::signed_zero("-0", true)]
    #[case::milli_cpu("100m", false)]
    #[case::cpu("1", false)]
    #[case::fraction("0.5", false)]
    #[case::leading_dot(".5", false)]
    #[case::memory("128Mi", false)]
    #[case::gigabytes("1G", false)]
    #[case::exponent("12e6", false)]
    #[case::exa("1E", false)]
    #[case::padded(" 256Mi ", false)]
    fn valid_quantities(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_zero(&Quantity(input.to_owned())), Ok(expected));
    }

    #[rstest]
    #[case::empty("", QuantityError::Empty)]
    #[case::blank("  ", QuantityError::Empty)]
    #[case::no_digits("Mi", QuantityError::InvalidFormat("Mi".to_owned()))]
    #[case::unknown_suffix("12MB", QuantityError::InvalidFormat("12MB".to_owned()))]
    #[case::words("lots", QuantityError::InvalidFormat("lots".to_owned()))]
    fn invalid_quantities(#[case] input: &str, #[case] expected: QuantityError) {
        assert_eq!(is_zero(&Quantity(input.to_owned())), Err(expected));
    }
}
