//! Group membership management.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        Store,
        models::{
            GroupEntity, GroupRole, MembershipError, NotificationData, NotificationKind,
            UserEntity,
        },
    },
    dto::{
        group::{
            AddMemberRequest, ChangeRoleRequest, CreateGroupRequest, GroupResponse,
            InviteCodeResponse, JoinGroupRequest,
        },
        validation::normalize_phone,
    },
    error::ServiceError,
    services::{
        notification_service, room_events,
        user_service::{ActingUser, load_user},
    },
    state::SharedState,
};

pub async fn create_group(
    state: &SharedState,
    actor: &ActingUser,
    payload: CreateGroupRequest,
) -> Result<GroupResponse, ServiceError> {
    let store = state.store().await?;
    let description = payload
        .description
        .map(|description| description.trim().to_owned())
        .filter(|description| !description.is_empty());
    let group = GroupEntity::new(payload.name.trim().to_owned(), description, actor.id);

    store.save_group(group.clone()).await?;
    link_user(state, &store, actor.id, group.id).await?;

    info!(group_id = %group.id, admin = %actor.id, "group created");
    Ok(group.into())
}

/// Groups of the caller, most recently active first.
pub async fn list_my_groups(
    state: &SharedState,
    actor: &ActingUser,
) -> Result<Vec<GroupResponse>, ServiceError> {
    let store = state.store().await?;
    let groups = store.list_member_groups(actor.id).await?;
    Ok(groups.into_iter().map(GroupResponse::from).collect())
}

pub async fn get_group(
    state: &SharedState,
    actor: &ActingUser,
    group_id: Uuid,
) -> Result<GroupResponse, ServiceError> {
    let store = state.store().await?;
    let group = load_group(&store, group_id).await?;
    require_member(&group, actor.id)?;
    Ok(group.into())
}

/// Add a registered player, found by phone number, to a group the caller administers.
pub async fn add_member(
    state: &SharedState,
    actor: &ActingUser,
    group_id: Uuid,
    payload: AddMemberRequest,
) -> Result<GroupResponse, ServiceError> {
    let store = state.store().await?;
    let phone = normalize_phone(&payload.phone_number);
    let user = store
        .find_user_by_phone(phone)
        .await?
        .ok_or_else(|| ServiceError::NotFound("no user registered with this phone number".into()))?;

    let group = state
        .serialized(group_id, || async {
            let mut group = load_group(&store, group_id).await?;
            require_admin(&group, actor.id)?;
            group.add_member(user.id, GroupRole::Member)?;
            store.save_group(group.clone()).await?;
            Ok(group)
        })
        .await?;

    welcome(state, &store, &group, &user, actor.id).await?;
    Ok(group.into())
}

/// Change the role of a member; the group always keeps one admin.
pub async fn change_member_role(
    state: &SharedState,
    actor: &ActingUser,
    group_id: Uuid,
    user_id: Uuid,
    payload: ChangeRoleRequest,
) -> Result<GroupResponse, ServiceError> {
    let store = state.store().await?;
    state
        .serialized(group_id, || async move {
            let mut group = load_group(&store, group_id).await?;
            require_admin(&group, actor.id)?;
            group
                .set_role(user_id, payload.role)
                .map_err(|err| match err {
                    MembershipError::NotMember => {
                        ServiceError::NotFound(format!("user `{user_id}` is not a member"))
                    }
                    other => other.into(),
                })?;
            store.save_group(group.clone()).await?;
            info!(%group_id, %user_id, role = ?payload.role, "member role changed");
            Ok(group.into())
        })
        .await
}

/// Leave a group. The last admin must hand over first.
pub async fn leave_group(
    state: &SharedState,
    actor: &ActingUser,
    group_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.store().await?;
    state
        .serialized(group_id, || async {
            let mut group = load_group(&store, group_id).await?;
            group.remove_member(actor.id).map_err(|err| match err {
                MembershipError::LastAdmin => ServiceError::InvalidInput(
                    "you are the only admin of this group; promote another member first".into(),
                ),
                other => other.into(),
            })?;
            store.save_group(group).await?;
            Ok(())
        })
        .await?;

    state
        .serialized(actor.id, || async {
            let mut user = load_user(&store, actor.id).await?;
            user.leave_group(group_id);
            store.save_user(user).await?;
            Ok(())
        })
        .await?;

    info!(%group_id, user_id = %actor.id, "member left group");
    Ok(())
}

/// Issue a fresh invite code, invalidating the previous one.
pub async fn generate_invite_code(
    state: &SharedState,
    actor: &ActingUser,
    group_id: Uuid,
) -> Result<InviteCodeResponse, ServiceError> {
    let store = state.store().await?;
    state
        .serialized(group_id, || async {
            let mut group = load_group(&store, group_id).await?;
            require_admin(&group, actor.id)?;
            let invite_code = group.regenerate_invite_code();
            store.save_group(group).await?;
            Ok(InviteCodeResponse { invite_code })
        })
        .await
}

/// Join the active group holding `code`.
pub async fn join_by_invite(
    state: &SharedState,
    actor: &ActingUser,
    payload: JoinGroupRequest,
) -> Result<GroupResponse, ServiceError> {
    let store = state.store().await?;
    let code = payload.code.trim().to_uppercase();
    let found = store
        .find_group_by_invite(code.clone())
        .await?
        .filter(|group| group.is_active)
        .ok_or_else(|| ServiceError::NotFound("invalid invite code".into()))?;
    let user = load_user(&store, actor.id).await?;

    let group = state
        .serialized(found.id, || async {
            let mut group = load_group(&store, found.id).await?;
            if group.invite_code.as_deref() != Some(code.as_str()) {
                return Err(ServiceError::NotFound("invalid invite code".into()));
            }
            group.add_member(actor.id, GroupRole::Member)?;
            store.save_group(group.clone()).await?;
            Ok(group)
        })
        .await?;

    welcome(state, &store, &group, &user, actor.id).await?;
    Ok(group.into())
}

/// Bookkeeping shared by every way into a group.
async fn welcome(
    state: &SharedState,
    store: &Arc<dyn Store>,
    group: &GroupEntity,
    user: &UserEntity,
    sender_id: Uuid,
) -> Result<(), ServiceError> {
    link_user(state, store, user.id, group.id).await?;
    notification_service::notify(
        store,
        NotificationKind::GroupJoined,
        [user.id],
        NotificationData {
            group_id: Some(group.id),
            sender_id: Some(sender_id),
            ..Default::default()
        },
    )
    .await;
    room_events::broadcast_member_added(state, group.id, user.id, user.name.clone());
    info!(group_id = %group.id, user_id = %user.id, "member added");
    Ok(())
}

async fn link_user(
    state: &SharedState,
    store: &Arc<dyn Store>,
    user_id: Uuid,
    group_id: Uuid,
) -> Result<(), ServiceError> {
    state
        .serialized(user_id, || async {
            let mut user = load_user(store, user_id).await?;
            user.join_group(group_id);
            store.save_user(user).await?;
            Ok(())
        })
        .await
}

/// Refresh the group's `last_activity`; failures are only logged.
pub(crate) async fn touch_activity(state: &SharedState, store: &Arc<dyn Store>, group_id: Uuid) {
    let touched = state
        .serialized(group_id, || async {
            let mut group = load_group(store, group_id).await?;
            group.touch();
            store.save_group(group).await?;
            Ok(())
        })
        .await;
    if let Err(err) = touched {
        warn!(%group_id, error = %err, "failed to refresh group activity");
    }
}

/// Load a group or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_group(
    store: &Arc<dyn Store>,
    group_id: Uuid,
) -> Result<GroupEntity, ServiceError> {
    store
        .find_group(group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("group `{group_id}` not found")))
}

pub(crate) fn require_member(group: &GroupEntity, user_id: Uuid) -> Result<(), ServiceError> {
    if group.is_member(user_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("not a member of this group".into()))
    }
}

pub(crate) fn require_admin(group: &GroupEntity, user_id: Uuid) -> Result<(), ServiceError> {
    if group.is_admin(user_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("only group admins can do this".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        testing::{memory_state as state, player},
        user_service,
    };

    fn create(name: &str) -> CreateGroupRequest {
        CreateGroupRequest {
            name: name.into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn creator_is_admin_and_linked() {
        let state = state().await;
        let ana = player(&state, "912000001", "Ana").await;
        let group = create_group(&state, &ana, create(" Quintas ")).await.unwrap();
        assert_eq!(group.name, "Quintas");
        assert_eq!(group.members[0].role, GroupRole::Admin);

        let profile = user_service::get_profile(&state, ana.id).await.unwrap();
        assert_eq!(profile.group_ids, vec![group.id]);
        assert_eq!(list_my_groups(&state, &ana).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_member_requires_admin_and_notifies() {
        let state = state().await;
        let ana = player(&state, "912000001", "Ana").await;
        let rui = player(&state, "912000002", "Rui").await;
        let group = create_group(&state, &ana, create("Quintas")).await.unwrap();
        let mut room = state.rooms().subscribe(group.id);

        let add = |phone: &str| AddMemberRequest {
            phone_number: phone.into(),
        };
        let err = add_member(&state, &rui, group.id, add("912000002")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let updated = add_member(&state, &ana, group.id, add("912 000 002")).await.unwrap();
        assert_eq!(updated.members.len(), 2);
        let err = add_member(&state, &ana, group.id, add("912000002")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let err = add_member(&state, &ana, group.id, add("912000099")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let event = room.recv().await.unwrap();
        assert!(event.payload.contains("member_added"));
        let inbox = notification_service::count_unread(&state, &rui).await.unwrap();
        assert_eq!(inbox.count, 1);
        assert!(get_group(&state, &rui, group.id).await.is_ok());
    }

    #[tokio::test]
    async fn sole_admin_cannot_leave_or_be_demoted() {
        let state = state().await;
        let ana = player(&state, "912000001", "Ana").await;
        let rui = player(&state, "912000002", "Rui").await;
        let group = create_group(&state, &ana, create("Quintas")).await.unwrap();

        let err = leave_group(&state, &ana, group.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let err = change_member_role(
            &state,
            &ana,
            group.id,
            ana.id,
            ChangeRoleRequest {
                role: GroupRole::Member,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = leave_group(&state, &rui, group.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn invite_codes_admit_new_members() {
        let state = state().await;
        let ana = player(&state, "912000001", "Ana").await;
        let rui = player(&state, "912000002", "Rui").await;
        let group = create_group(&state, &ana, create("Quintas")).await.unwrap();

        let err = generate_invite_code(&state, &rui, group.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let code = generate_invite_code(&state, &ana, group.id)
            .await
            .unwrap()
            .invite_code;
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

        let err = join_by_invite(&state, &rui, JoinGroupRequest { code: "ZZZZZZ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let joined = join_by_invite(&state, &rui, JoinGroupRequest { code: code.to_lowercase() })
            .await
            .unwrap();
        assert!(joined.members.iter().any(|member| member.user_id == rui.id));

        leave_group(&state, &rui, group.id).await.unwrap();
        let profile = user_service::get_profile(&state, rui.id).await.unwrap();
        assert!(profile.group_ids.is_empty());
    }
}
