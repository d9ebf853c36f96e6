//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Adapter for `#[graphql(with = ..)]` attribute representing a domain type
/// as a GraphQL string scalar via its `As` representation.
///
/// Output is rendered with the [`Display`] impl of `As`, while input is
/// parsed with its [`FromStr`] impl and then validated by the [`TryFrom`]
/// impl of the domain type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Renders the provided `value` as a string scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::scalar(value.as_ref().to_string())
    }

    /// Parses the domain type out of the provided string [`InputValue`].
    ///
    /// # Errors
    ///
    /// If the `input` is not a string, or it doesn't represent a valid `As`,
    /// or the domain type rejects the parsed `As`.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let invalid = |reason: &dyn fmt::Display| {
            format!(
                "Cannot parse input scalar `{}`: {reason}",
                T::name(&()).unwrap_or("<unnamed>"),
            )
        };

        let raw = input.as_string_value().ok_or_else(|| {
            invalid(&format_args!("expected string, found: {input}"))
        })?;
        let parsed = raw
            .parse::<As>()
            .map_err(|e| invalid(&format_args!("\"{raw}\": {e}")))?;
        T::try_from(parsed).map_err(|e| invalid(&e))
    }

    /// Parses the provided [`ScalarToken`] as a string.
    ///
    /// # Errors
    ///
    /// If the `token` is not a string.
    pub fn parse_token<S: ScalarValue>(
        token: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(token)
    }
}
