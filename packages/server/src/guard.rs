use mongodb::bson::oid::ObjectId;

use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// A resource with a single owning user.
pub trait Owned {
    /// Noun used in error messages.
    const KIND: &'static str;

    fn owner_id(&self) -> ObjectId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny(String),
}

impl Access {
    /// Map a denial to `Forbidden`, naming what was attempted.
    pub fn into_result(self, kind: &str, action: &str) -> Result<(), AppError> {
        match self {
            Access::Allow => Ok(()),
            Access::Deny(reason) => {
                tracing::debug!(kind, action, reason = %reason, "Access denied");
                Err(AppError::Forbidden(format!(
                    "Only the owner can {action} this {kind}"
                )))
            }
        }
    }
}

/// Compare owner and caller by their canonical hex form.
pub fn authorize(resource_owner: &ObjectId, caller: &ObjectId) -> Access {
    if resource_owner.to_hex() == caller.to_hex() {
        Access::Allow
    } else {
        Access::Deny(format!(
            "caller {} does not own a resource of {}",
            caller.to_hex(),
            resource_owner.to_hex()
        ))
    }
}

impl AuthUser {
    /// `Ok(())` if this user owns `resource`, `Forbidden` otherwise.
    pub fn authorize<R: Owned>(&self, resource: &R, action: &str) -> Result<(), AppError> {
        authorize(&resource.owner_id(), &self.user_id).into_result(R::KIND, action)
    }
}
