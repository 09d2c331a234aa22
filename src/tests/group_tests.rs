use super::{create_test_service, register, setup_group};
use crate::error::ChiptabError;
use crate::models::Role;

#[tokio::test]
async fn test_register_and_login() {
    let service = create_test_service();
    let player = register(&service, "Alice").await;

    let token = service
        .authenticate("alice@example.com", "hunter2")
        .await
        .unwrap();
    let claims = service.validate_token(&token).unwrap();
    assert_eq!(claims.sub, player.id);
    assert_eq!(claims.role, "PLAYER");

    let wrong = service.authenticate("alice@example.com", "wrong").await;
    assert!(matches!(wrong, Err(ChiptabError::InvalidCredentials)));

    let unknown = service.authenticate("nobody@example.com", "hunter2").await;
    assert!(matches!(unknown, Err(ChiptabError::InvalidCredentials)));
}

#[tokio::test]
async fn test_register_validations() {
    let service = create_test_service();

    let missing = service
        .register_player(
            "Alice".to_string(),
            "".to_string(),
            None,
            "pw".to_string(),
            None,
        )
        .await;
    assert!(matches!(missing, Err(ChiptabError::MissingEmail)));

    let invalid = service
        .register_player(
            "Alice".to_string(),
            "not-an-email".to_string(),
            None,
            "pw".to_string(),
            None,
        )
        .await;
    assert!(matches!(invalid, Err(ChiptabError::InvalidEmail(_))));

    register(&service, "Alice").await;
    let duplicate = service
        .register_player(
            "Alice Again".to_string(),
            "alice@example.com".to_string(),
            None,
            "pw".to_string(),
            None,
        )
        .await;
    assert!(matches!(
        duplicate,
        Err(ChiptabError::EmailAlreadyRegistered(_))
    ));
}

#[tokio::test]
async fn test_create_group_assigns_single_owner() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob", "Carol"]).await;

    assert_eq!(group.members.len(), 3);
    let owners: Vec<_> = group.members.iter().filter(|m| m.is_owner()).collect();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].player.id, players[0].id);
    assert!(
        group
            .members
            .iter()
            .filter(|m| m.player.id != players[0].id)
            .all(|m| m.role == Role::Member)
    );
}

#[tokio::test]
async fn test_join_group_by_link() {
    let service = create_test_service();
    let (group, _) = setup_group(&service, &["Alice", "Bob"]).await;
    let dan = register(&service, "Dan").await;

    let joined = service
        .join_group_by_link(&group.join_link, &dan)
        .await
        .unwrap();
    assert!(joined.is_member(&dan.id));

    let again = service.join_group_by_link(&group.join_link, &dan).await;
    assert!(matches!(again, Err(ChiptabError::AlreadyGroupMember(_))));

    let bad_link = service.join_group_by_link("no-such-link", &dan).await;
    assert!(matches!(bad_link, Err(ChiptabError::JoinLinkNotFound)));
}

#[tokio::test]
async fn test_regenerated_link_invalidates_old_one() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let dan = register(&service, "Dan").await;

    let new_link = service
        .regenerate_join_link(&group.id, &players[0])
        .await
        .unwrap();
    assert_ne!(new_link, group.join_link);

    let old = service.join_group_by_link(&group.join_link, &dan).await;
    assert!(matches!(old, Err(ChiptabError::JoinLinkNotFound)));
    service.join_group_by_link(&new_link, &dan).await.unwrap();
}

#[tokio::test]
async fn test_owner_rules_for_member_removal() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob", "Carol"]).await;
    let (alice, bob, carol) = (&players[0], &players[1], &players[2]);

    let not_owner = service
        .remove_member_from_group(&group.id, &carol.id, bob)
        .await;
    assert!(matches!(not_owner, Err(ChiptabError::NotGroupOwner(_))));

    let self_removal = service
        .remove_member_from_group(&group.id, &alice.id, alice)
        .await;
    assert!(matches!(
        self_removal,
        Err(ChiptabError::OwnerCannotRemoveSelf)
    ));

    service
        .remove_member_from_group(&group.id, &carol.id, alice)
        .await
        .unwrap();
    let group = service.get_group(&group.id).await.unwrap().unwrap();
    assert!(!group.is_member(&carol.id));
}

#[tokio::test]
async fn test_transfer_ownership() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let (alice, bob) = (&players[0], &players[1]);

    service
        .transfer_ownership(&group.id, bob, alice)
        .await
        .unwrap();

    let group = service.get_group(&group.id).await.unwrap().unwrap();
    let owner = group.members.iter().find(|m| m.is_owner()).unwrap();
    assert_eq!(owner.player.id, bob.id);

    // The previous owner lost their privileges.
    let demoted = service.transfer_ownership(&group.id, alice, alice).await;
    assert!(matches!(demoted, Err(ChiptabError::NotGroupOwner(_))));
}

#[tokio::test]
async fn test_partnership_validation() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob", "Carol"]).await;
    let (alice, bob, carol) = (&players[0], &players[1], &players[2]);
    let outsider = register(&service, "Dan").await;

    let self_pair = service
        .create_partnership(&group.id, &alice.id, &alice.id, alice)
        .await;
    assert!(matches!(self_pair, Err(ChiptabError::SelfPartnership)));

    let not_member = service
        .create_partnership(&group.id, &alice.id, &outsider.id, alice)
        .await;
    assert!(matches!(not_member, Err(ChiptabError::NotGroupMember(_))));

    let partnership = service
        .create_partnership(&group.id, &alice.id, &bob.id, alice)
        .await
        .unwrap();
    assert!(partnership.active);

    let overlap = service
        .create_partnership(&group.id, &bob.id, &carol.id, carol)
        .await;
    assert!(matches!(overlap, Err(ChiptabError::PartnershipOverlap(_))));

    // A member of the pair can retire it; afterwards the overlap is gone.
    service
        .deactivate_partnership(&partnership.id, bob)
        .await
        .unwrap();
    service
        .create_partnership(&group.id, &bob.id, &carol.id, carol)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_partnership_deactivation_requires_owner_or_member() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob", "Carol"]).await;
    let (alice, bob, carol) = (&players[0], &players[1], &players[2]);

    let partnership = service
        .create_partnership(&group.id, &alice.id, &bob.id, alice)
        .await
        .unwrap();

    let stranger = service.deactivate_partnership(&partnership.id, carol).await;
    assert!(matches!(stranger, Err(ChiptabError::NotGroupOwner(_))));

    service
        .deactivate_partnership(&partnership.id, alice)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_removing_member_retires_their_partnerships() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob", "Carol"]).await;
    let (alice, bob) = (&players[0], &players[1]);

    service
        .create_partnership(&group.id, &bob.id, &players[2].id, alice)
        .await
        .unwrap();

    service
        .remove_member_from_group(&group.id, &bob.id, alice)
        .await
        .unwrap();

    let recorded = service
        .get_group_audits(&group.id)
        .await
        .unwrap()
        .iter()
        .any(|a| a.action == crate::constants::MEMBER_REMOVED);
    assert!(recorded);

    // The pairing no longer blocks a new one for Carol.
    service
        .create_partnership(&group.id, &alice.id, &players[2].id, alice)
        .await
        .unwrap();
}
