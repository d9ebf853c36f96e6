//! Date and time utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, marker::PhantomData, ops, time::Duration};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{format_description::well_known::Rfc3339, UtcOffset};

/// Date and time of no particular kind.
pub type DateTime = DateTimeOf;

/// UTC date and time with a microsecond precision, tagged with the kind of
/// event it `Of`.
///
/// Kinds are not mixed up implicitly, but may be [`coerce`]d explicitly.
///
/// [`coerce`]: DateTimeOf::coerce
#[derive(Debug)]
pub struct DateTimeOf<Of: ?Sized = ()> {
    /// UTC moment, truncated to microseconds.
    inner: time::OffsetDateTime,

    /// Kind of the event.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

/// Converts the provided `dt` into UTC, truncating it to microseconds, as
/// Postgres stores timestamps.
fn utc_micros(
    dt: time::OffsetDateTime,
) -> Result<time::OffsetDateTime, time::error::ComponentRange> {
    dt.to_offset(UtcOffset::UTC)
        .replace_microsecond(dt.microsecond())
}

impl<Of: ?Sized> DateTimeOf<Of> {
    /// Wraps the provided UTC `inner` moment.
    const fn wrap(inner: time::OffsetDateTime) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }

    /// Returns the current [`DateTime`] of the system clock.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn now() -> Self {
        Self::wrap(
            utc_micros(time::OffsetDateTime::now_utc())
                .expect("own microseconds are always in range"),
        )
    }

    /// Creates a new [`DateTime`] from the provided Unix `timestamp` (in
    /// seconds).
    ///
    /// [`None`] is returned if the `timestamp` is out of range.
    #[must_use]
    pub fn from_unix_timestamp(timestamp: i64) -> Option<Self> {
        time::OffsetDateTime::from_unix_timestamp(timestamp)
            .ok()
            .map(Self::wrap)
    }

    /// Returns the Unix timestamp (in seconds) of this [`DateTime`].
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.inner.unix_timestamp()
    }

    /// Creates a new [`DateTime`] from the provided [RFC 3339] string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid [RFC 3339] date and time.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub fn from_rfc3339(input: &str) -> Result<Self, ParseError> {
        use ParseError as E;

        time::OffsetDateTime::parse(input, &Rfc3339)
            .map_err(E::Parse)?
            .try_into()
            .map_err(E::ComponentRange)
    }

    /// Returns the [`DateTime`] as an [RFC 3339] string.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.inner.format(&Rfc3339).unwrap_or_else(|e| {
            panic!("cannot format `DateTime` as RFC 3339: {e}")
        })
    }

    /// Returns [`Duration`] passed since the provided `earlier` [`DateTime`].
    ///
    /// [`Duration::ZERO`] is returned if `earlier` is actually later than
    /// this [`DateTime`].
    #[must_use]
    pub fn saturating_duration_since<E: ?Sized>(
        &self,
        earlier: DateTimeOf<E>,
    ) -> Duration {
        (self.inner - earlier.inner)
            .try_into()
            .unwrap_or(Duration::ZERO)
    }

    /// Coerces one kind of [`DateTime`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateTimeOf<NewOf> {
        DateTimeOf::wrap(self.inner)
    }
}

/// Error of parsing [`DateTime`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// Failed to parse the string into an [`DateTime`].
    Parse(time::error::Parse),

    /// Parsed [`DateTime`] has an out of range component.
    ComponentRange(time::error::ComponentRange),
}

impl<Of: ?Sized> Copy for DateTimeOf<Of> {}
impl<Of: ?Sized> Clone for DateTimeOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateTimeOf<Of> {}
impl<Of: ?Sized> PartialEq for DateTimeOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateTimeOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateTimeOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> TryFrom<time::OffsetDateTime> for DateTimeOf<Of> {
    type Error = time::error::ComponentRange;

    fn try_from(dt: time::OffsetDateTime) -> Result<Self, Self::Error> {
        utc_micros(dt).map(Self::wrap)
    }
}

impl<Of: ?Sized> From<DateTimeOf<Of>> for time::OffsetDateTime {
    fn from(dt: DateTimeOf<Of>) -> Self {
        dt.inner
    }
}

impl<Of: ?Sized> ops::Add<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::wrap(self.inner + rhs)
    }
}

impl<Of: ?Sized> ops::Sub<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self::wrap(self.inner - rhs)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::OffsetDateTime::from_sql(ty, raw)?
            .try_into()
            .map_err(Box::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
pub mod serde {
    //! [`serde`] representations of a [`DateTimeOf`].

    pub mod unix_timestamp {
        //! [`DateTimeOf`] (de)serialized as an integer Unix timestamp (in
        //! seconds), as [JWT] claims carry it.
        //!
        //! [`DateTimeOf`]: crate::DateTimeOf
        //! [JWT]: https://datatracker.ietf.org/doc/html/rfc7519#section-2

        use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

        use crate::DateTimeOf;

        /// Serializes the provided [`DateTimeOf`] as a Unix timestamp.
        ///
        /// # Errors
        ///
        /// If the `serializer` fails.
        pub fn serialize<Of, S>(
            dt: &DateTimeOf<Of>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            Of: ?Sized,
            S: Serializer,
        {
            serializer.serialize_i64(dt.unix_timestamp())
        }

        /// Deserializes a [`DateTimeOf`] from a Unix timestamp.
        ///
        /// # Errors
        ///
        /// If the value is not an integer, or is out of range.
        pub fn deserialize<'de, Of, D>(
            deserializer: D,
        ) -> Result<DateTimeOf<Of>, D::Error>
        where
            Of: ?Sized,
            D: Deserializer<'de>,
        {
            let ts = i64::deserialize(deserializer)?;
            DateTimeOf::from_unix_timestamp(ts).ok_or_else(|| {
                D::Error::custom(format!("Unix timestamp {ts} is out of range"))
            })
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! [`juniper`] representation of a [`DateTime`].

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// UTC date and time in [RFC 3339] format, with a microsecond precision.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[graphql_scalar(with = Self, parse_token(String))]
    type DateTime = crate::DateTime;

    impl DateTime {
        fn to_output<S: ScalarValue>(dt: &DateTime) -> Value<S> {
            Value::scalar(dt.to_rfc3339())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            let Some(s) = input.as_string_value() else {
                return Err(format!(
                    "Expected RFC 3339 string for `DateTime`, found: {input}",
                ));
            };
            Self::from_rfc3339(s)
                .map_err(|e| format!("Invalid `DateTime` \"{s}\": {e}"))
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::DateTime;

    #[test]
    fn saturating_duration_since() {
        let earlier = DateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let later = earlier + Duration::from_secs(9 * 60);

        assert_eq!(
            later.saturating_duration_since(earlier),
            Duration::from_secs(9 * 60),
        );
        assert_eq!(earlier.saturating_duration_since(later), Duration::ZERO);
    }

    #[test]
    fn rfc3339_round_trip() {
        let dt = DateTime::from_rfc3339("2026-10-18T12:30:00Z").unwrap();

        assert_eq!(dt.to_rfc3339(), "2026-10-18T12:30:00Z");
        assert_eq!(DateTime::from_rfc3339(&dt.to_rfc3339()).unwrap(), dt);
    }
}
