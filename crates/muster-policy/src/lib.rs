//! Pure authorization decisions. Nothing here touches storage: callers
//! resolve the acting user's entitlements and the relevant existing rows
//! up front and pass them in, so every rule is a plain function over sets.
//!
//! Filters never fail for "nothing permitted" — an empty permitted set is
//! a normal return value, and the caller decides what an all-denied
//! request should look like on the wire.

use std::collections::BTreeSet;

use muster_types::api::TaskPatch;

pub type GroupId = i64;

/// What the acting user is entitled to, resolved once per request.
///
/// `administered` holds the groups where the user's membership row carries
/// the admin flag. `elevated` means the user administers the root `admin`
/// group and may grant or revoke any membership.
#[derive(Debug, Clone, Default)]
pub struct Entitlements {
    pub user_id: i64,
    pub administered: BTreeSet<GroupId>,
    pub elevated: bool,
}

impl Entitlements {
    pub fn administers(&self, group: GroupId) -> bool {
        self.elevated || self.administered.contains(&group)
    }
}

/// Subset of `requested` the acting user may grant to someone.
///
/// Ids that do not resolve to an existing group are dropped silently —
/// exclusion is the denial signal, never an error.
pub fn filter_add_groups(
    requested: &BTreeSet<GroupId>,
    existing: &BTreeSet<GroupId>,
    entitlements: &Entitlements,
) -> BTreeSet<GroupId> {
    requested
        .iter()
        .copied()
        .filter(|id| existing.contains(id))
        .filter(|id| entitlements.administers(*id))
        .collect()
}

/// Subset of `requested` the acting user may remove from `target_user`.
///
/// Same entitlement rule as [`filter_add_groups`], with one addition: a
/// user may always remove itself from a group it currently belongs to,
/// admin or not.
pub fn filter_delete_groups(
    requested: &BTreeSet<GroupId>,
    existing: &BTreeSet<GroupId>,
    target_user: i64,
    target_memberships: &BTreeSet<GroupId>,
    entitlements: &Entitlements,
) -> BTreeSet<GroupId> {
    let self_leave = target_user == entitlements.user_id;

    requested
        .iter()
        .copied()
        .filter(|id| existing.contains(id))
        .filter(|id| {
            entitlements.administers(*id) || (self_leave && target_memberships.contains(id))
        })
        .collect()
}

/// Strips task fields outside the caller's write scope.
///
/// `description` is derived from `markdown` and never client-settable.
/// `title` and `markdown` require elevation; `done` is open to any
/// authenticated user. A patch that comes back empty is a valid no-op.
pub fn filter_update_task(patch: TaskPatch, entitlements: &Entitlements) -> TaskPatch {
    let TaskPatch {
        title,
        markdown,
        description: _,
        done,
    } = patch;

    if entitlements.elevated {
        TaskPatch {
            title,
            markdown,
            description: None,
            done,
        }
    } else {
        TaskPatch {
            done,
            ..TaskPatch::default()
        }
    }
}

/// Coarse all-or-nothing gate for mission and event top-level mutation.
pub fn allows_update(entitlements: &Entitlements) -> bool {
    entitlements.elevated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[i64]) -> BTreeSet<GroupId> {
        v.iter().copied().collect()
    }

    fn admin_of(user_id: i64, groups: &[i64]) -> Entitlements {
        Entitlements {
            user_id,
            administered: ids(groups),
            elevated: false,
        }
    }

    #[test]
    fn add_permits_only_administered_groups() {
        // User 1 administers group 10; group 20 exists but is not theirs.
        let ent = admin_of(1, &[10]);
        let permitted = filter_add_groups(&ids(&[10, 20]), &ids(&[10, 20]), &ent);
        assert_eq!(permitted, ids(&[10]));
    }

    #[test]
    fn add_result_is_subset_of_requested() {
        let ent = admin_of(1, &[10, 20, 30]);
        let requested = ids(&[10, 20]);
        let permitted = filter_add_groups(&requested, &ids(&[10, 20, 30]), &ent);
        assert!(permitted.is_subset(&requested));
    }

    #[test]
    fn add_drops_unknown_group_ids_silently() {
        let ent = admin_of(1, &[10, 99]);
        // 99 is administered but does not exist any more
        let permitted = filter_add_groups(&ids(&[10, 99]), &ids(&[10]), &ent);
        assert_eq!(permitted, ids(&[10]));
    }

    #[test]
    fn add_empty_permitted_set_is_not_an_error() {
        let ent = admin_of(1, &[]);
        let permitted = filter_add_groups(&ids(&[10, 20]), &ids(&[10, 20]), &ent);
        assert!(permitted.is_empty());
    }

    #[test]
    fn elevated_user_may_grant_any_existing_group() {
        let ent = Entitlements {
            user_id: 1,
            administered: BTreeSet::new(),
            elevated: true,
        };
        let permitted = filter_add_groups(&ids(&[10, 20]), &ids(&[10, 20]), &ent);
        assert_eq!(permitted, ids(&[10, 20]));
    }

    #[test]
    fn add_is_idempotent_over_its_own_output() {
        let ent = admin_of(1, &[10]);
        let existing = ids(&[10, 20]);
        let once = filter_add_groups(&ids(&[10, 20]), &existing, &ent);
        let twice = filter_add_groups(&once, &existing, &ent);
        assert_eq!(once, twice);
    }

    #[test]
    fn self_leave_succeeds_without_admin_status() {
        let ent = admin_of(2, &[]);
        let permitted = filter_delete_groups(&ids(&[10]), &ids(&[10]), 2, &ids(&[10]), &ent);
        assert_eq!(permitted, ids(&[10]));
    }

    #[test]
    fn self_leave_does_not_cover_groups_the_user_is_not_in() {
        let ent = admin_of(2, &[]);
        let permitted = filter_delete_groups(&ids(&[10, 20]), &ids(&[10, 20]), 2, &ids(&[10]), &ent);
        assert_eq!(permitted, ids(&[10]));
    }

    #[test]
    fn delete_for_another_user_still_requires_admin() {
        let ent = admin_of(1, &[10]);
        let permitted = filter_delete_groups(&ids(&[10, 20]), &ids(&[10, 20]), 2, &ids(&[10, 20]), &ent);
        assert_eq!(permitted, ids(&[10]));
    }

    #[test]
    fn task_patch_keeps_done_for_plain_users() {
        let ent = admin_of(3, &[]);
        let patch = TaskPatch {
            title: Some("new title".into()),
            markdown: Some("body".into()),
            description: Some("sneaky".into()),
            done: Some(true),
        };
        let sanitized = filter_update_task(patch, &ent);
        assert_eq!(
            sanitized,
            TaskPatch {
                done: Some(true),
                ..TaskPatch::default()
            }
        );
    }

    #[test]
    fn task_patch_strips_description_even_when_elevated() {
        let ent = Entitlements {
            user_id: 3,
            administered: BTreeSet::new(),
            elevated: true,
        };
        let patch = TaskPatch {
            title: Some("new title".into()),
            markdown: None,
            description: Some("derived".into()),
            done: None,
        };
        let sanitized = filter_update_task(patch, &ent);
        assert_eq!(sanitized.title.as_deref(), Some("new title"));
        assert!(sanitized.description.is_none());
    }

    #[test]
    fn fully_stripped_patch_is_empty_not_an_error() {
        let ent = admin_of(3, &[]);
        let patch = TaskPatch {
            title: Some("t".into()),
            markdown: Some("m".into()),
            description: None,
            done: None,
        };
        assert!(filter_update_task(patch, &ent).is_empty());
    }

    #[test]
    fn coarse_gate_requires_elevation() {
        assert!(!allows_update(&admin_of(1, &[10, 20])));
        assert!(allows_update(&Entitlements {
            user_id: 1,
            administered: BTreeSet::new(),
            elevated: true,
        }));
    }
}
