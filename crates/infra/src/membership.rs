//! Businesses and who may act for them.
//!
//! Just enough to map a signed-in email to the tenant whose catalog it works
//! on. Emails are matched case-insensitively and belong to one business.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use rentbook_core::{TenantId, UserId};

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Staff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: TenantId,
    pub name: String,
    pub owner: UserId,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

fn normalize_email(email: &str) -> Result<String, LedgerError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(LedgerError::Validation(format!(
            "'{email}' is not an email address"
        )));
    }
    Ok(email)
}

#[derive(Debug, Default)]
struct Directory {
    businesses: HashMap<TenantId, Business>,
    /// Normalized email -> membership.
    members: HashMap<String, Member>,
}

/// In-memory business and membership registry.
#[derive(Debug, Default)]
pub struct MembershipDirectory {
    inner: RwLock<Directory>,
}

impl MembershipDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Directory>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::StorageUnavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Directory>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::StorageUnavailable("lock poisoned".to_string()))
    }

    /// Create a business with `owner` as its first member.
    pub fn register_business(
        &self,
        name: &str,
        owner: UserId,
        owner_email: &str,
        at: DateTime<Utc>,
    ) -> Result<Business, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "business name cannot be empty".to_string(),
            ));
        }
        let email = normalize_email(owner_email)?;

        let mut dir = self.write()?;
        if dir.members.contains_key(&email) {
            return Err(LedgerError::conflict(format!(
                "{email} already belongs to a business"
            )));
        }

        let business = Business {
            id: TenantId::new(),
            name: name.to_string(),
            owner,
            owner_email: email.clone(),
            created_at: at,
        };
        dir.members.insert(
            email.clone(),
            Member {
                tenant_id: business.id,
                user_id: owner,
                email,
                role: Role::Owner,
            },
        );
        dir.businesses.insert(business.id, business.clone());

        info!(tenant = %business.id, name = %business.name, "business registered");
        Ok(business)
    }

    pub fn add_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        email: &str,
        role: Role,
    ) -> Result<Member, LedgerError> {
        let email = normalize_email(email)?;

        let mut dir = self.write()?;
        if !dir.businesses.contains_key(&tenant_id) {
            return Err(LedgerError::not_found(format!("business {tenant_id}")));
        }
        if let Some(existing) = dir.members.get(&email) {
            if existing.tenant_id == tenant_id {
                return Ok(existing.clone());
            }
            return Err(LedgerError::conflict(format!(
                "{email} already belongs to another business"
            )));
        }

        let member = Member {
            tenant_id,
            user_id,
            email: email.clone(),
            role,
        };
        dir.members.insert(email, member.clone());
        info!(tenant = %tenant_id, role = ?role, "member added");
        Ok(member)
    }

    /// Which business `email` works for.
    pub fn resolve_tenant(&self, email: &str) -> Result<TenantId, LedgerError> {
        let email = normalize_email(email)?;
        self.read()?
            .members
            .get(&email)
            .map(|m| m.tenant_id)
            .ok_or_else(|| LedgerError::not_found(format!("no business for {email}")))
    }

    pub fn business(&self, tenant_id: TenantId) -> Result<Business, LedgerError> {
        self.read()?
            .businesses
            .get(&tenant_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(format!("business {tenant_id}")))
    }

    pub fn members(&self, tenant_id: TenantId) -> Result<Vec<Member>, LedgerError> {
        let mut members: Vec<Member> = self
            .read()?
            .members
            .values()
            .filter(|m| m.tenant_id == tenant_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory_with_business() -> (MembershipDirectory, Business) {
        let dir = MembershipDirectory::new();
        let business = dir
            .register_business(" Ada Rentals ", UserId::new(), "Ada@Example.com", Utc::now())
            .unwrap();
        (dir, business)
    }

    #[test]
    fn owner_email_resolves_case_insensitively() {
        let (dir, business) = directory_with_business();
        assert_eq!(business.name, "Ada Rentals");
        assert_eq!(dir.resolve_tenant(" ada@EXAMPLE.com ").unwrap(), business.id);
        assert_eq!(dir.business(business.id).unwrap(), business);
    }

    #[test]
    fn staff_resolve_to_their_business() {
        let (dir, business) = directory_with_business();
        dir.add_member(business.id, UserId::new(), "bola@example.com", Role::Staff)
            .unwrap();
        assert_eq!(dir.resolve_tenant("bola@example.com").unwrap(), business.id);

        let roles: Vec<Role> = dir
            .members(business.id)
            .unwrap()
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![Role::Owner, Role::Staff]);
    }

    #[test]
    fn an_email_belongs_to_one_business() {
        let (dir, _) = directory_with_business();
        let other = dir
            .register_business("Other", UserId::new(), "chidi@example.com", Utc::now())
            .unwrap();
        let err = dir
            .add_member(other.id, UserId::new(), "ADA@example.com", Role::Staff)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[test]
    fn unknown_email_or_business_is_not_found() {
        let (dir, _) = directory_with_business();
        assert!(matches!(
            dir.resolve_tenant("nobody@example.com"),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            dir.add_member(TenantId::new(), UserId::new(), "x@example.com", Role::Staff),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            dir.register_business("", UserId::new(), "y@example.com", Utc::now()),
            Err(LedgerError::Validation(_))
        ));
    }
}
