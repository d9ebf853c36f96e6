//! Kind enums, stored as small integer codes.

use derive_more::{Display, Error};

/// Defines a fieldless kind enum with explicit `u8` codes.
///
/// The enum is displayed and parsed in `SCREAMING_SNAKE_CASE`, converts from
/// its code with [`TryFrom`]`<u8>`, and is stored as `INT2` in Postgres when
/// the calling crate enables its `postgres` feature.
///
/// # Example
///
/// ```rust
/// use common::define_kind;
///
/// define_kind! {
///     #[doc = "Kind of a stored food."]
///     enum Category {
///         #[doc = "Packaged grocery."]
///         Grocery = 1,
///
///         #[doc = "Cooked meal."]
///         Cooked = 2,
///     }
/// }
///
/// assert_eq!(Category::try_from(2_u8), Ok(Category::Cooked));
/// assert_eq!(Category::Grocery.to_string(), "GROCERY");
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $code:literal
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            PartialEq,
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(
                #[doc = $variant_doc]
                $variant = $code,
            )*
        }

        impl $name {
            /// Returns the stored code of this kind.
            #[must_use]
            pub const fn code(self) -> u8 {
                self as u8
            }
        }

        impl ::core::convert::TryFrom<u8> for $name {
            type Error = $crate::UnknownKind;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $( $code => Ok(Self::$variant), )*
                    _ => Err($crate::UnknownKind {
                        kind: ::core::stringify!($name),
                        code,
                    }),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                Self,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                let code = u8::try_from(
                    <i16 as $crate::private::postgres_types::FromSql<'_>>
                        ::from_sql(ty, raw)?,
                )?;
                Ok(Self::try_from(code)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                $crate::private::postgres_types::ToSql::to_sql(
                    &i16::from(self.code()),
                    ty,
                    w,
                )
            }
        }
    };
}

/// Error of converting an unknown code into a kind enum.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("unknown `{kind}` code: {code}")]
pub struct UnknownKind {
    /// Name of the kind enum.
    pub kind: &'static str,

    /// Unknown code.
    pub code: u8,
}

#[cfg(test)]
mod spec {
    use super::UnknownKind;

    crate::define_kind! {
        #[doc = "Test kind."]
        enum Shelf {
            #[doc = "Fridge."]
            Fridge = 1,

            #[doc = "Freezer."]
            DeepFreezer = 2,
        }
    }

    #[test]
    fn converts_known_codes_only() {
        assert_eq!(Shelf::try_from(1_u8), Ok(Shelf::Fridge));
        assert_eq!(Shelf::DeepFreezer.code(), 2);
        assert_eq!(
            Shelf::try_from(3_u8),
            Err(UnknownKind {
                kind: "Shelf",
                code: 3,
            }),
        );
    }

    #[test]
    fn displays_and_parses_screaming_snake_case() {
        assert_eq!(Shelf::DeepFreezer.to_string(), "DEEP_FREEZER");
        assert_eq!("FRIDGE".parse::<Shelf>(), Ok(Shelf::Fridge));
    }
}
