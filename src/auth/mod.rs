//! Contraseñas (bcrypt) y guardas de sesión por rol.
//!
//! El usuario autenticado vive en la cookie de sesión bajo la clave `user`;
//! los handlers llaman a `require_*` al principio y propagan el error con `?`.

use actix_session::Session;

use crate::error::{ApiError, ApiResult};
use crate::models::{Role, SessionUser};

const SESSION_USER_KEY: &str = "user";
const BCRYPT_COST: u32 = 10;

pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, BCRYPT_COST)
}

/// Un hash corrupto cuenta como contraseña inválida, no como error.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

pub fn current_user(session: &Session) -> ApiResult<Option<SessionUser>> {
    Ok(session.get::<SessionUser>(SESSION_USER_KEY)?)
}

/// Guarda el usuario en una sesión nueva (renueva la cookie).
pub fn start_session(session: &Session, user: &SessionUser) -> ApiResult<()> {
    session.renew();
    session.insert(SESSION_USER_KEY, user)?;
    Ok(())
}

pub fn end_session(session: &Session) {
    session.purge();
}

pub fn require_auth(session: &Session) -> ApiResult<SessionUser> {
    current_user(session)?.ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}

pub fn require_admin(session: &Session) -> ApiResult<SessionUser> {
    let user = require_auth(session)?;
    if user.role != Role::Admin {
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(user)
}

/// Instructor o administrador.
pub fn require_instructor(session: &Session) -> ApiResult<SessionUser> {
    let user = require_auth(session)?;
    if !user.role.can_teach() {
        return Err(ApiError::forbidden("Instructor access required"));
    }
    Ok(user)
}
