//! [`Error`]-related definitions.

use std::fmt;

use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use juniper::IntoFieldError;
use service::infra::database;
use tracerr::{Trace, Traced};

/// Defines a new error type convertible into an API [`Error`].
///
/// Every variant is annotated with its `#[code]`, the `#[status]` of the HTTP
/// response (as named in [`http::StatusCode`]), and the human-readable
/// `#[message]`.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                let (code, status) = match err {
                    $(
                        $name::$variant => {
                            ($code, ::http::StatusCode::$status)
                        }
                    )*
                };
                Self::new(code, status, err)
            }
        }
    };
}

/// GraphQL API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// Machine-readable [`Code`] of this [`Error`].
    pub code: Code,

    /// [`http::StatusCode`] to respond with.
    pub status_code: http::StatusCode,

    /// [`Trace`] of where this [`Error`] originated, if known.
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// Human-readable message.
    pub message: String,
}

impl Error {
    /// Creates a new [`Error`] without any [`Trace`].
    #[must_use]
    pub fn new(
        code: Code,
        status_code: http::StatusCode,
        message: impl ToString,
    ) -> Self {
        Self {
            code,
            status_code,
            backtrace: None,
            message: message.to_string(),
        }
    }

    /// Creates a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self::new(
            "INTERNAL_SERVER_ERROR",
            http::StatusCode::INTERNAL_SERVER_ERROR,
            msg.to_string(),
        )
    }

    /// Attaches the provided [`Trace`] to this [`Error`].
    #[must_use]
    pub fn traced(mut self, trace: Trace) -> Self {
        self.backtrace = Some(trace);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.code, self.message)?;
        if let Some(trace) = &self.backtrace {
            write!(f, "\n{trace}")?;
        }
        Ok(())
    }
}

impl<S> IntoFieldError<S> for Error
where
    S: From<String>,
{
    fn into_field_error(self) -> juniper::FieldError<S> {
        let Self {
            code,
            status_code,
            backtrace,
            message,
        } = self;

        let frames = backtrace
            .iter()
            .flat_map(|trace| trace.iter())
            .map(|frame| juniper::Value::scalar(frame.to_string()))
            .collect();

        let mut ext = juniper::Object::with_capacity(3);
        for (name, value) in [
            ("code", juniper::Value::scalar(code.to_owned())),
            ("status", juniper::Value::scalar(status_code.to_string())),
            ("backtrace", juniper::Value::list(frames)),
        ] {
            _ = ext.add_field(name, value);
        }
        juniper::FieldError::new(message, juniper::Value::object(ext))
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Conversion of failures into API [`Error`]s.
pub trait AsError {
    /// Tries to convert this failure into an [`Error`].
    ///
    /// [`None`] means the failure is not meant for the API client, so should
    /// be reported as an internal one.
    fn try_as_error(&self) -> Option<Error>;

    /// Converts this failure into an [`Error`], falling back to an
    /// [`Error::internal()`] one.
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts this failure into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        self.as_ref()
            .try_as_error()
            .map(|e| e.traced(self.trace().clone()))
    }
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new(
            "BAD_REQUEST",
            http::StatusCode::BAD_REQUEST,
            self,
        ))
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, IntoFieldError as _};

    use super::{AsError as _, Error};

    crate::define_error! {
        enum TestError {
            #[code = "TEST_GONE"]
            #[status = GONE]
            #[message = "Gone for good"]
            Gone,
        }
    }

    #[test]
    fn defined_error_carries_code_and_status() {
        let err = Error::from(TestError::Gone);

        assert_eq!(err.code, "TEST_GONE");
        assert_eq!(err.status_code, http::StatusCode::GONE);
        assert_eq!(err.message, "Gone for good");
        assert_eq!(err.to_string(), "[TEST_GONE]: Gone for good");
    }

    #[derive(derive_more::Display)]
    #[display("connection reset")]
    struct Unexposed;

    impl super::AsError for Unexposed {
        fn try_as_error(&self) -> Option<Error> {
            None
        }
    }

    #[test]
    fn unexposed_failure_is_internal() {
        let err = tracerr::new!(Unexposed).into_error();

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "connection reset");
    }

    #[test]
    fn field_error_exposes_code_and_status() {
        let err: juniper::FieldError<DefaultScalarValue> =
            Error::from(TestError::Gone).into_field_error();

        assert_eq!(err.message(), "Gone for good");
        let ext = err.extensions().as_object_value().unwrap();
        assert_eq!(
            ext.get_field_value("code").and_then(|v| v.as_scalar()),
            Some(&DefaultScalarValue::from("TEST_GONE".to_owned())),
        );
        assert_eq!(
            ext.get_field_value("status").and_then(|v| v.as_scalar()),
            Some(&DefaultScalarValue::from("410 Gone".to_owned())),
        );
    }
}
