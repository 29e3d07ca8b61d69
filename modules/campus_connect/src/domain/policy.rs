//! Who may create and who may modify content. Pure decisions, no I/O.

use uuid::Uuid;

use crate::contract::model::{Caller, ContentItem, ContentKind, Role};

/// Announcements and events need faculty or admin; any account may share a resource.
pub fn can_create(role: Role, kind: ContentKind) -> bool {
    match kind {
        ContentKind::Announcement | ContentKind::Event => {
            matches!(role, Role::Faculty | Role::Admin)
        }
        ContentKind::Resource => true,
    }
}

/// Owner or admin. Compares the stored author id only, so a deleted
/// author's content stays editable by admins and nobody else.
pub fn can_modify(caller: Option<&Caller>, owner_id: Uuid) -> bool {
    match caller {
        Some(c) => c.user_id == owner_id || c.is_admin(),
        None => false,
    }
}

pub fn can_modify_item(caller: Option<&Caller>, item: &ContentItem) -> bool {
    can_modify(caller, item.created_by.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{ContentDetails, UserRef};
    use chrono::Utc;
    use std::collections::BTreeSet;

    #[test]
    fn create_truth_table() {
        let cases = [
            (Role::Student, ContentKind::Announcement, false),
            (Role::Student, ContentKind::Event, false),
            (Role::Student, ContentKind::Resource, true),
            (Role::Faculty, ContentKind::Announcement, true),
            (Role::Faculty, ContentKind::Event, true),
            (Role::Faculty, ContentKind::Resource, true),
            (Role::Admin, ContentKind::Announcement, true),
            (Role::Admin, ContentKind::Event, true),
            (Role::Admin, ContentKind::Resource, true),
        ];
        for (role, kind, expected) in cases {
            assert_eq!(can_create(role, kind), expected, "{role} creating {kind}");
        }
    }

    #[test]
    fn modify_is_owner_or_admin() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        for role in [Role::Student, Role::Faculty, Role::Admin] {
            assert!(can_modify(Some(&Caller::new(owner, role)), owner));
        }
        assert!(!can_modify(Some(&Caller::new(stranger, Role::Student)), owner));
        assert!(!can_modify(Some(&Caller::new(stranger, Role::Faculty)), owner));
        assert!(can_modify(Some(&Caller::new(stranger, Role::Admin)), owner));
        assert!(!can_modify(None, owner));
    }

    #[test]
    fn dangling_author_is_judged_by_stored_id() {
        let gone = Uuid::new_v4();
        let item = ContentItem {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: "d".into(),
            created_by: UserRef::unresolved(gone),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            details: ContentDetails::Announcement,
            comments: vec![],
            likes: BTreeSet::new(),
        };
        assert!(can_modify_item(Some(&Caller::new(gone, Role::Student)), &item));
        assert!(!can_modify_item(
            Some(&Caller::new(Uuid::new_v4(), Role::Faculty)),
            &item
        ));
    }
}
