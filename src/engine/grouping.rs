use super::{EntityKind, ParticipantResult, SettlementEntity, SettlementUnit};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Collapses per-player results into settlement entities.
///
/// Each active unit whose two members are distinct, present in `results`,
/// and not yet claimed by an earlier unit becomes one `Unit` entity whose
/// balance is the exact sum of both members' results. Everyone left over
/// becomes an `Individual` entity, in input order, after the units.
///
/// Units that cannot be honored are skipped, not reported: session data in
/// the wild is partial (a partner who skipped the night, a stale pairing),
/// and the night still has to settle.
pub fn group_entities(
    results: &[ParticipantResult],
    units: &[SettlementUnit],
) -> Vec<SettlementEntity> {
    let mut by_id: HashMap<&str, &ParticipantResult> = HashMap::new();
    for result in results {
        // First occurrence wins if the caller hands us duplicate ids.
        by_id.entry(result.participant_id.as_str()).or_insert(result);
    }

    let mut consumed: HashSet<&str> = HashSet::new();
    let mut entities: Vec<SettlementEntity> = Vec::with_capacity(results.len());

    for unit in units {
        match unit_members(unit, &by_id, &consumed) {
            Some((a, b)) => {
                consumed.insert(a.participant_id.as_str());
                consumed.insert(b.participant_id.as_str());
                entities.push(SettlementEntity {
                    entity_id: unit.unit_id.clone(),
                    kind: EntityKind::Unit,
                    display_name: format!("{} & {}", a.display_name, b.display_name),
                    balance: a.net_result + b.net_result,
                    member_ids: vec![a.participant_id.clone(), b.participant_id.clone()],
                });
            }
            None => debug!("skipping settlement unit {}", unit.unit_id),
        }
    }

    let mut emitted: HashSet<&str> = HashSet::new();
    for result in results {
        let id = result.participant_id.as_str();
        if consumed.contains(id) || !emitted.insert(id) {
            continue;
        }
        entities.push(SettlementEntity {
            entity_id: result.participant_id.clone(),
            kind: EntityKind::Individual,
            display_name: result.display_name.clone(),
            balance: result.net_result,
            member_ids: vec![result.participant_id.clone()],
        });
    }

    entities
}

/// Resolves the two members of a unit, or `None` when the unit cannot be
/// honored: inactive, self-paired, a member missing from the results, or a
/// member already claimed by an earlier unit.
fn unit_members<'a>(
    unit: &SettlementUnit,
    by_id: &HashMap<&str, &'a ParticipantResult>,
    consumed: &HashSet<&str>,
) -> Option<(&'a ParticipantResult, &'a ParticipantResult)> {
    if !unit.active {
        return None;
    }
    let [first, second] = &unit.member_ids;
    if first == second {
        return None;
    }
    if consumed.contains(first.as_str()) || consumed.contains(second.as_str()) {
        return None;
    }
    let a = *by_id.get(first.as_str())?;
    let b = *by_id.get(second.as_str())?;
    Some((a, b))
}
