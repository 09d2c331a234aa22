use super::{create_test_service, register, run_session, setup_group};
use crate::error::ChiptabError;
use crate::models::SessionStatus;

#[tokio::test]
async fn test_buy_in_and_rebuy_flow() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let alice = &players[0];

    let session = service
        .create_session(&group.id, "Tuesday".to_string(), None, alice)
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Open);

    service
        .record_buy_in(&session.id, &alice.id, 100.0, alice)
        .await
        .unwrap();
    let session = service
        .record_buy_in(&session.id, &alice.id, 50.0, alice)
        .await
        .unwrap();

    let entry = session.player(&alice.id).unwrap();
    assert_eq!(entry.buy_ins, vec![100.0, 50.0]);
    assert_eq!(entry.total_buy_in(), 150.0);
    assert!(entry.cash_out.is_none());
    assert_eq!(entry.net_result(), None);

    let session = service
        .record_cash_out(&session.id, &alice.id, 200.0, alice)
        .await
        .unwrap();
    assert_eq!(session.player(&alice.id).unwrap().net_result(), Some(50.0));
}

#[tokio::test]
async fn test_buy_in_validations() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let alice = &players[0];
    let outsider = register(&service, "Dan").await;

    let session = service
        .create_session(&group.id, "Tuesday".to_string(), None, alice)
        .await
        .unwrap();

    let negative = service
        .record_buy_in(&session.id, &alice.id, -5.0, alice)
        .await;
    assert!(matches!(negative, Err(ChiptabError::InvalidInput(_, _))));

    let fractional = service
        .record_buy_in(&session.id, &alice.id, 10.001, alice)
        .await;
    assert!(matches!(fractional, Err(ChiptabError::InvalidInput(_, _))));

    let not_member = service
        .record_buy_in(&session.id, &outsider.id, 10.0, alice)
        .await;
    assert!(matches!(not_member, Err(ChiptabError::NotGroupMember(_))));

    let never_bought_in = service
        .record_cash_out(&session.id, &players[1].id, 10.0, alice)
        .await;
    assert!(matches!(
        never_bought_in,
        Err(ChiptabError::PlayerNotInSession(_))
    ));
}

#[tokio::test]
async fn test_settle_session_two_players() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let (alice, bob) = (&players[0], &players[1]);

    let session = run_session(
        &service,
        &group,
        alice,
        &[(alice, 50.0, 100.0), (bob, 50.0, 0.0)],
    )
    .await;

    let settlement = service.settle_session(&session.id, alice).await.unwrap();
    assert!(settlement.is_balanced());
    assert_eq!(settlement.lines().len(), 1);

    let line = &settlement.lines()[0];
    assert_eq!(line.from_entity_id, bob.id);
    assert_eq!(line.from_name, "Bob");
    assert_eq!(line.to_entity_id, alice.id);
    assert_eq!(line.to_name, "Alice");
    assert_eq!(line.amount, 50.0);
}

#[tokio::test]
async fn test_settle_requires_all_cash_outs() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let alice = &players[0];

    let session = service
        .create_session(&group.id, "Tuesday".to_string(), None, alice)
        .await
        .unwrap();
    service
        .record_buy_in(&session.id, &alice.id, 100.0, alice)
        .await
        .unwrap();

    let result = service.settle_session(&session.id, alice).await;
    assert!(matches!(result, Err(ChiptabError::MissingCashOuts(1))));
}

#[tokio::test]
async fn test_unbalanced_session_cannot_close() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let (alice, bob) = (&players[0], &players[1]);

    // 100 bought in, 110 cashed out: somebody miscounted.
    let session = run_session(
        &service,
        &group,
        alice,
        &[(alice, 50.0, 110.0), (bob, 50.0, 0.0)],
    )
    .await;

    let settlement = service.settle_session(&session.id, alice).await.unwrap();
    assert!(!settlement.is_balanced());
    assert_eq!(settlement.imbalance(), 10.0);
    // The transfer list still clears what it can.
    assert_eq!(settlement.lines().len(), 1);
    assert_eq!(settlement.lines()[0].amount, 50.0);

    let closed = service.close_session(&session.id, alice).await;
    assert!(matches!(
        closed,
        Err(ChiptabError::SessionOutOfBalance(_, _))
    ));
}

#[tokio::test]
async fn test_partnership_settles_as_one_party() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob", "Carol"]).await;
    let (alice, bob, carol) = (&players[0], &players[1], &players[2]);

    let partnership = service
        .create_partnership(&group.id, &alice.id, &bob.id, alice)
        .await
        .unwrap();

    let session = run_session(
        &service,
        &group,
        alice,
        &[
            (alice, 20.0, 50.0),  // +30
            (bob, 20.0, 30.0),    // +10
            (carol, 50.0, 10.0),  // -40
        ],
    )
    .await;

    let settlement = service.settle_session(&session.id, alice).await.unwrap();
    assert!(settlement.is_balanced());
    assert_eq!(settlement.lines().len(), 1);

    let line = &settlement.lines()[0];
    assert_eq!(line.from_entity_id, carol.id);
    assert_eq!(line.to_entity_id, partnership.id);
    assert_eq!(line.to_name, "Alice & Bob");
    assert_eq!(line.amount, 40.0);
}

#[tokio::test]
async fn test_closed_session_rejects_changes() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let (alice, bob) = (&players[0], &players[1]);

    let session = run_session(
        &service,
        &group,
        alice,
        &[(alice, 50.0, 100.0), (bob, 50.0, 0.0)],
    )
    .await;
    service.close_session(&session.id, alice).await.unwrap();

    let stored = service.get_session(&session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Closed);

    let buy_in = service
        .record_buy_in(&session.id, &alice.id, 10.0, alice)
        .await;
    assert!(matches!(buy_in, Err(ChiptabError::SessionClosed(_))));

    let reclose = service.close_session(&session.id, alice).await;
    assert!(matches!(reclose, Err(ChiptabError::SessionClosed(_))));
}

#[tokio::test]
async fn test_cash_out_correction_recomputes_settlement() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let (alice, bob) = (&players[0], &players[1]);

    let session = run_session(
        &service,
        &group,
        alice,
        &[(alice, 50.0, 100.0), (bob, 50.0, 0.0)],
    )
    .await;

    let before = service.settle_session(&session.id, alice).await.unwrap();
    assert_eq!(before.lines()[0].from_entity_id, bob.id);

    // The chips were actually the other way around; corrections must not be
    // served from the cache.
    service
        .record_cash_out(&session.id, &alice.id, 0.0, alice)
        .await
        .unwrap();
    service
        .record_cash_out(&session.id, &bob.id, 100.0, alice)
        .await
        .unwrap();

    let after = service.settle_session(&session.id, alice).await.unwrap();
    assert_eq!(after.lines().len(), 1);
    assert_eq!(after.lines()[0].from_entity_id, alice.id);
    assert_eq!(after.lines()[0].to_entity_id, bob.id);
}

#[tokio::test]
async fn test_close_requires_owner() {
    let service = create_test_service();
    let (group, players) = setup_group(&service, &["Alice", "Bob"]).await;
    let (alice, bob) = (&players[0], &players[1]);

    let session = run_session(
        &service,
        &group,
        alice,
        &[(alice, 50.0, 100.0), (bob, 50.0, 0.0)],
    )
    .await;

    let not_owner = service.close_session(&session.id, bob).await;
    assert!(matches!(not_owner, Err(ChiptabError::NotGroupOwner(_))));
}
