use crate::engine::money::{from_cents, to_cents};
use crate::engine::{
    EntityKind, ParticipantResult, SettlementEntity, SettlementUnit, Transfer, group_entities,
    settle,
};

fn result(id: &str, net: f64) -> ParticipantResult {
    let mut name = id.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    ParticipantResult {
        participant_id: id.to_string(),
        display_name: name,
        net_result: net,
    }
}

fn unit(id: &str, first: &str, second: &str, active: bool) -> SettlementUnit {
    SettlementUnit {
        unit_id: id.to_string(),
        member_ids: [first.to_string(), second.to_string()],
        active,
    }
}

fn individuals(balances: &[(&str, f64)]) -> Vec<SettlementEntity> {
    let results: Vec<ParticipantResult> =
        balances.iter().map(|&(id, net)| result(id, net)).collect();
    group_entities(&results, &[])
}

/// Payments received minus payments made.
fn net_delta(transfers: &[Transfer], entity_id: &str) -> f64 {
    transfers
        .iter()
        .map(|t| {
            if t.to_entity_id == entity_id {
                t.amount
            } else if t.from_entity_id == entity_id {
                -t.amount
            } else {
                0.0
            }
        })
        .sum()
}

#[test]
fn empty_input_yields_no_transfers() {
    assert!(settle(&[]).is_empty());
}

#[test]
fn two_players_settle_with_one_transfer() {
    let transfers = settle(&individuals(&[("a", 100.0), ("b", -100.0)]));
    assert_eq!(
        transfers,
        vec![Transfer {
            from_entity_id: "b".to_string(),
            to_entity_id: "a".to_string(),
            amount: 100.0,
        }]
    );
}

#[test]
fn largest_creditor_is_paid_first() {
    let transfers = settle(&individuals(&[("a", 60.0), ("b", 40.0), ("c", -100.0)]));
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].from_entity_id, "c");
    assert_eq!(transfers[0].to_entity_id, "a");
    assert_eq!(transfers[0].amount, 60.0);
    assert_eq!(transfers[1].from_entity_id, "c");
    assert_eq!(transfers[1].to_entity_id, "b");
    assert_eq!(transfers[1].amount, 40.0);
}

#[test]
fn all_zero_session_settles_to_nothing() {
    let transfers = settle(&individuals(&[("a", 0.0), ("b", 0.0), ("c", 0.0)]));
    assert!(transfers.is_empty());
}

#[test]
fn zero_balance_entities_are_inert() {
    let transfers = settle(&individuals(&[("a", 50.0), ("b", 0.0), ("c", -50.0)]));
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from_entity_id, "c");
    assert_eq!(transfers[0].to_entity_id, "a");
}

#[test]
fn broken_zero_sum_leaves_residual_unpaid() {
    // Sum is +10; the debtor can only cover 40 of the 50 owed.
    let transfers = settle(&individuals(&[("a", 50.0), ("b", -40.0)]));
    assert_eq!(
        transfers,
        vec![Transfer {
            from_entity_id: "b".to_string(),
            to_entity_id: "a".to_string(),
            amount: 40.0,
        }]
    );
    assert!((net_delta(&transfers, "a") - 40.0).abs() < 0.011);
}

#[test]
fn cent_residuals_are_ignored() {
    assert!(settle(&individuals(&[("a", 0.01), ("b", -0.01)])).is_empty());

    let transfers = settle(&individuals(&[("a", 0.02), ("b", -0.02)]));
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].amount, 0.02);
}

#[test]
fn creditor_ties_go_to_input_order() {
    let transfers = settle(&individuals(&[("a", 50.0), ("b", 50.0), ("c", -100.0)]));
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].to_entity_id, "a");
    assert_eq!(transfers[1].to_entity_id, "b");
}

#[test]
fn debtor_ties_go_to_input_order() {
    let transfers = settle(&individuals(&[("a", 100.0), ("b", -50.0), ("c", -50.0)]));
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].from_entity_id, "b");
    assert_eq!(transfers[1].from_entity_id, "c");
}

#[test]
fn settle_is_deterministic() {
    let entities = individuals(&[
        ("a", 31.5),
        ("b", -12.25),
        ("c", 4.75),
        ("d", -19.0),
        ("e", -5.0),
    ]);
    assert_eq!(settle(&entities), settle(&entities));
}

#[test]
fn settle_does_not_mutate_its_input() {
    let entities = individuals(&[("a", 25.0), ("b", -25.0)]);
    let balances: Vec<f64> = entities.iter().map(|e| e.balance).collect();
    settle(&entities);
    assert_eq!(
        balances,
        entities.iter().map(|e| e.balance).collect::<Vec<f64>>()
    );
}

#[test]
fn transfer_count_is_bounded_and_balances_conserved() {
    let entities = individuals(&[
        ("a", 30.0),
        ("b", 20.0),
        ("c", 10.0),
        ("d", -15.0),
        ("e", -25.0),
        ("f", -20.0),
    ]);
    let transfers = settle(&entities);

    // At most n - 1 transfers for n non-zero entities.
    assert!(transfers.len() <= 5);

    for transfer in &transfers {
        assert!(transfer.amount > 0.0);
        assert_ne!(transfer.from_entity_id, transfer.to_entity_id);
    }
    for entity in &entities {
        assert!((net_delta(&transfers, &entity.entity_id) - entity.balance).abs() < 0.011);
    }
}

#[test]
fn unit_balance_is_the_sum_of_member_results() {
    let results = vec![result("a", 50.0), result("b", -20.0)];
    let entities = group_entities(&results, &[unit("p1", "a", "b", true)]);
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].kind, EntityKind::Unit);
    assert_eq!(entities[0].entity_id, "p1");
    assert_eq!(entities[0].display_name, "A & B");
    assert_eq!(entities[0].balance, 30.0);
    assert_eq!(entities[0].member_ids, vec!["a", "b"]);
}

#[test]
fn unit_settles_as_one_party() {
    let results = vec![result("a", 30.0), result("b", 10.0), result("c", -40.0)];
    let entities = group_entities(&results, &[unit("p1", "a", "b", true)]);
    let transfers = settle(&entities);
    assert_eq!(
        transfers,
        vec![Transfer {
            from_entity_id: "c".to_string(),
            to_entity_id: "p1".to_string(),
            amount: 40.0,
        }]
    );
}

#[test]
fn inactive_unit_is_ignored() {
    let results = vec![result("a", 50.0), result("b", -50.0)];
    let entities = group_entities(&results, &[unit("p1", "a", "b", false)]);
    assert_eq!(entities.len(), 2);
    assert!(entities.iter().all(|e| e.kind == EntityKind::Individual));
}

#[test]
fn unit_with_missing_member_is_ignored() {
    let results = vec![result("a", 50.0), result("b", -50.0)];
    let entities = group_entities(&results, &[unit("p1", "a", "ghost", true)]);
    assert_eq!(entities.len(), 2);
    assert!(entities.iter().all(|e| e.kind == EntityKind::Individual));

    // Both referenced players still settle as individuals.
    let transfers = settle(&entities);
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from_entity_id, "b");
    assert_eq!(transfers[0].to_entity_id, "a");
}

#[test]
fn self_paired_unit_is_ignored() {
    let results = vec![result("a", 50.0), result("b", -50.0)];
    let entities = group_entities(&results, &[unit("p1", "a", "a", true)]);
    assert_eq!(entities.len(), 2);
    assert!(entities.iter().all(|e| e.kind == EntityKind::Individual));
}

#[test]
fn overlapping_units_first_wins() {
    let results = vec![result("a", 10.0), result("b", 20.0), result("c", -30.0)];
    let units = vec![unit("p1", "a", "b", true), unit("p2", "b", "c", true)];
    let entities = group_entities(&results, &units);
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].entity_id, "p1");
    assert_eq!(entities[0].kind, EntityKind::Unit);
    assert_eq!(entities[1].entity_id, "c");
    assert_eq!(entities[1].kind, EntityKind::Individual);
}

#[test]
fn units_precede_individuals_in_output() {
    let results = vec![result("a", 10.0), result("b", -5.0), result("c", -5.0)];
    let entities = group_entities(&results, &[unit("p1", "b", "c", true)]);
    assert_eq!(entities[0].entity_id, "p1");
    assert_eq!(entities[1].entity_id, "a");
}

#[test]
fn grouping_is_idempotent() {
    let results = vec![result("a", 12.5), result("b", -7.5), result("c", -5.0)];
    let units = vec![unit("p1", "a", "b", true)];
    let first: Vec<(String, f64)> = group_entities(&results, &units)
        .into_iter()
        .map(|e| (e.entity_id, e.balance))
        .collect();
    let second: Vec<(String, f64)> = group_entities(&results, &units)
        .into_iter()
        .map(|e| (e.entity_id, e.balance))
        .collect();
    assert_eq!(first, second);
}

#[test]
fn cents_conversion_rounds_ties_away_from_zero() {
    assert_eq!(to_cents(0.125), 13);
    assert_eq!(to_cents(-0.125), -13);
    assert_eq!(to_cents(29.99), 2999);
    assert_eq!(to_cents(0.0), 0);
    assert_eq!(from_cents(2999), 29.99);
    assert_eq!(from_cents(-50), -0.5);
}
