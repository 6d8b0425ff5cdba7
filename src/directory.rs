//! Account directory consumed by the dispatch core.
//!
//! Registration and authentication live outside this service; the core only
//! needs existence, role and contact lookups.

use dashmap::DashMap;

use crate::error::AppError;
use crate::models::actor::{Actor, ActorId, ContactInfo, Role};

pub trait AccountDirectory: Send + Sync {
    fn actor_exists(&self, id: ActorId) -> bool;

    fn role(&self, id: ActorId) -> Option<Role>;

    fn contact_info(&self, id: ActorId) -> Option<ContactInfo>;

    /// Every actor whose role allows volunteering.
    fn volunteer_ids(&self) -> Vec<ActorId>;
}

#[derive(Default)]
pub struct InMemoryDirectory {
    actors: DashMap<ActorId, Actor>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, actor: Actor) -> Actor {
        self.actors.insert(actor.id, actor.clone());
        actor
    }

    pub fn get(&self, id: ActorId) -> Option<Actor> {
        self.actors.get(&id).map(|entry| entry.value().clone())
    }

    pub fn set_role(&self, id: ActorId, role: Role) -> Result<Actor, AppError> {
        let mut actor = self.actors.get_mut(&id).ok_or(AppError::ActorNotFound(id))?;
        actor.role = role;
        Ok(actor.clone())
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl AccountDirectory for InMemoryDirectory {
    fn actor_exists(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    fn role(&self, id: ActorId) -> Option<Role> {
        self.actors.get(&id).map(|actor| actor.role)
    }

    fn contact_info(&self, id: ActorId) -> Option<ContactInfo> {
        self.actors.get(&id).map(|actor| actor.contact.clone())
    }

    fn volunteer_ids(&self) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|entry| entry.value().role.can_volunteer())
            .map(|entry| *entry.key())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountDirectory, InMemoryDirectory};
    use crate::error::AppError;
    use crate::models::actor::{Actor, ContactInfo, Role};

    fn actor(id: i64, role: Role) -> Actor {
        Actor {
            id,
            role,
            contact: ContactInfo::default(),
        }
    }

    #[test]
    fn volunteer_ids_include_both_role() {
        let directory = InMemoryDirectory::new();
        directory.upsert(actor(1, Role::Requester));
        directory.upsert(actor(2, Role::Volunteer));
        directory.upsert(actor(3, Role::Both));

        let mut ids = directory.volunteer_ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn set_role_upgrades_requester() {
        let directory = InMemoryDirectory::new();
        directory.upsert(actor(1, Role::Requester));

        let updated = directory.set_role(1, Role::Both).unwrap();
        assert_eq!(updated.role, Role::Both);
        assert_eq!(directory.role(1), Some(Role::Both));
    }

    #[test]
    fn set_role_on_unknown_actor() {
        let directory = InMemoryDirectory::new();
        let err = directory.set_role(9, Role::Volunteer).unwrap_err();
        assert!(matches!(err, AppError::ActorNotFound(9)));
    }
}
