use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{common::user::Role, db::user::User, mongodb::Id};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// A capability that a route can demand of its caller.
///
/// The capability is a zero-sized marker on [`AuthToken`], making the
/// required role a visible precondition of the route signature.
pub trait Capability {
    /// The role the caller must hold, or `None` for any identified user.
    const REQUIRED_ROLE: Option<Role>;
}

/// Any identified user, regardless of role.
pub struct AnyUser;

impl Capability for AnyUser {
    const REQUIRED_ROLE: Option<Role> = None;
}

/// A user holding the coordinator role.
pub struct Coordinator;

impl Capability for Coordinator {
    const REQUIRED_ROLE: Option<Role> = Some(Role::Coordinator);
}

/// An authentication token representing a specific user with a specific role.
#[derive(Serialize, Deserialize)]
pub struct AuthToken<C> {
    pub id: Id,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(skip)]
    phantom: PhantomData<C>,
}

impl AuthToken<AnyUser> {
    /// Create a new [`AuthToken`] for the given user.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            phantom: PhantomData,
        }
    }
}

impl<C> AuthToken<C> {
    /// Does this token hold the given role?
    pub fn permits(&self, target: Role) -> bool {
        self.role == target
    }

    #[allow(clippy::missing_panics_doc)]
    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<C>>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<C> {
    #[serde(flatten, bound = "")]
    token: AuthToken<C>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r, C> FromRequest<'r> for AuthToken<C>
where
    C: Capability + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie and verify that it grants the
    /// required capability. A missing or invalid cookie is 401; a valid
    /// cookie with the wrong role is 403. Either failure halts the route
    /// before it runs, so protected operations have no partial effect.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::Status(Status::Unauthorized, "No auth token".to_string()),
                ));
            }
        };

        let token: Self = match Self::from_cookie(cookie, config) {
            Ok(token) => token,
            Err(err) => {
                return Outcome::Failure((Status::Unauthorized, err));
            }
        };

        if let Some(required) = C::REQUIRED_ROLE {
            if !token.permits(required) {
                return Outcome::Failure((
                    Status::Forbidden,
                    Error::Status(
                        Status::Forbidden,
                        format!("This operation requires the {} role", required),
                    ),
                ));
            }
        }

        Outcome::Success(token)
    }
}

/// Login credentials.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::db::user::UserCore;

    #[test]
    fn coordinator_capability_requires_coordinator_role() {
        let respondent = User {
            id: Id::new(),
            user: UserCore::example_respondent(),
        };
        let token = AuthToken::new(&respondent);
        assert!(token.permits(Role::Respondent));
        assert!(!token.permits(Role::Coordinator));
        assert_ne!(Coordinator::REQUIRED_ROLE, Some(token.role));

        let coordinator = User {
            id: Id::new(),
            user: UserCore::example_coordinator(),
        };
        let token = AuthToken::new(&coordinator);
        assert!(token.permits(Role::Coordinator));
        assert_eq!(Coordinator::REQUIRED_ROLE, Some(token.role));
        assert_eq!(AnyUser::REQUIRED_ROLE, None);
    }
}
