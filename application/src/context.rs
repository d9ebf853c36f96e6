//! [`Context`]-related definitions.

use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use service::{
    command::{self, Command as _},
    domain::user::{session, Caller},
};
use tokio::sync::OnceCell;

use crate::{api, define_error, AsError, Error, GraphQlResponse, Service};

/// Per-request GraphQL context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] executing commands and queries.
    service: Service,

    /// Status of the HTTP response if the GraphQL execution fails.
    error_status: AtomicU16,

    /// Parts of the HTTP request carrying the credentials.
    parts: http::request::Parts,

    /// Outcome of authenticating the request, resolved on first use.
    auth: OnceCell<Result<Session, Error>>,
}

impl Context {
    /// Returns the [`Service`] of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the [`http::StatusCode`] to respond with if the GraphQL
    /// execution fails.
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status.load(atomic::Ordering::Relaxed),
        )
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Remembers the [`http::StatusCode`] of the provided [`Error`] and
    /// passes it through, so it can be used in [`Result::map_err()`].
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.error_status
                .store(err.status_code.as_u16(), atomic::Ordering::Relaxed);
            err
        }
    }

    /// Returns the [`Session`] the current request is authenticated with.
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current request carries no credentials;
    /// - the provided authentication token is invalid or expired.
    pub async fn current_session(&self) -> Result<Session, Error> {
        self.auth
            .get_or_init(|| self.authenticate())
            .await
            .clone()
            .map_err(self.error())
    }

    /// Takes the `authToken` from the [`juniper::Variables`] the client
    /// provides on GraphQL subscription initialization.
    ///
    /// # Errors
    ///
    /// Errors if the `authToken` is not a valid bearer token.
    pub(crate) fn authorize_with(
        &mut self,
        vars: &juniper::Variables,
    ) -> Result<(), Error> {
        let Some(token) = vars.get("authToken") else {
            return Ok(());
        };
        let header = token
            .as_string_value()
            .and_then(|t| format!("Bearer {t}").parse().ok())
            .ok_or_else(|| Error::from(AuthError::InvalidVariables))?;
        _ = self.parts.headers.insert(http::header::AUTHORIZATION, header);
        Ok(())
    }

    /// Authenticates the current request by its bearer token.
    async fn authenticate(&self) -> Result<Session, Error> {
        let TypedHeader(Authorization(bearer)) = self
            .parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                if e.is_missing() {
                    AuthError::AuthorizationRequired.into()
                } else {
                    e.into_error()
                }
            })?;

        #[expect(unsafe_code, reason = "taken from the bearer header")]
        let token =
            unsafe { session::Token::new_unchecked(bearer.token().to_owned()) };
        let session = self
            .service
            .execute(command::AuthorizeUserSession {
                token: token.clone(),
            })
            .await
            .map_err(AsError::into_error)?;

        Ok(Session {
            user_id: session.user_id.into(),
            role: session.role.into(),
            token,
            expires_at: session.expires_at.coerce(),
        })
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = GraphQlResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts.extensions.get::<Service>().cloned().ok_or_else(
            || {
                GraphQlResponse::failed(Error::internal(
                    &"missing `Service` extension",
                ))
            },
        )?;

        Ok(Self {
            service,
            error_status: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            parts: parts.clone(),
            auth: OnceCell::new(),
        })
    }
}

/// Authenticated user session.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the authenticated user.
    pub user_id: api::user::Id,

    /// [`api::user::Role`] the user acts in.
    pub role: api::user::Role,

    /// Token this [`Session`] is authenticated with.
    pub token: session::Token,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,
}

impl Session {
    /// Returns the [`Caller`] acting within this [`Session`].
    #[must_use]
    pub fn caller(&self) -> Caller {
        Caller {
            id: self.user_id.into(),
            role: self.role.into(),
        }
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::JsonWebTokenDecodeError(_) => {
                Some(AuthError::AuthorizationRequired.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_VARIABLES"]
        #[status = BAD_REQUEST]
        #[message = "Invalid subscription authorization variables"]
        InvalidVariables,
    }
}
