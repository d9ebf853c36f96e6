//! [`Command`] for authorizing a [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`].
///
/// Only the token signature and expiration are checked: users are owned by
/// the identity service issuing the tokens.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, Clk> Command<AuthorizeUserSession> for Service<Db, Clk> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        Ok(jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{DecodingKey, EncodingKey, Header};

    use super::{AuthorizeUserSession, ExecutionError};
    use crate::{
        domain::user::{self, session::Token, Role, Session},
        Command as _, Config, Service,
    };

    const SECRET: &[u8] = b"secret";

    fn service() -> Service<()> {
        Service::new(
            Config {
                jwt_decoding_key: DecodingKey::from_secret(SECRET),
                donation_lock_ttl: Duration::from_secs(600),
            },
            (),
        )
    }

    fn token(session: &Session) -> Token {
        jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
        .parse()
        .unwrap()
    }

    #[tokio::test]
    async fn decodes_valid_token() {
        let session = Session {
            user_id: user::Id::new(),
            role: Role::Recipient,
            expires_at: (DateTime::now() + Duration::from_secs(3600)).coerce(),
        };

        let authorized = service()
            .execute(AuthorizeUserSession::from(token(&session)))
            .await
            .unwrap();

        assert_eq!(authorized.user_id, session.user_id);
        assert_eq!(authorized.role, Role::Recipient);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let session = Session {
            user_id: user::Id::new(),
            role: Role::Donor,
            expires_at: (DateTime::now() - Duration::from_secs(3600)).coerce(),
        };

        let err = service()
            .execute(AuthorizeUserSession::from(token(&session)))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }
}
