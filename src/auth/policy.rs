//! Who may change what.

use uuid::Uuid;

use super::AuthenticatedUser;
use crate::models::ROLE_ADMIN;

pub fn is_staff(user: &AuthenticatedUser) -> bool {
    user.role == ROLE_ADMIN
}

/// Owners manage their own companies and jobs; staff manage everything.
pub fn can_manage(user: &AuthenticatedUser, owner_id: Uuid) -> bool {
    user.user_id == owner_id || is_staff(user)
}
