mod engine_tests;
mod group_tests;
mod session_tests;

use crate::cache::in_memory::InMemoryCache;
use crate::logging::in_memory::InMemoryLogging;
use crate::models::{Group, Player, Session};
use crate::service::ChiptabService;
use crate::storage::in_memory::InMemoryStorage;

pub type TestService = ChiptabService<InMemoryLogging, InMemoryStorage, InMemoryCache>;

pub fn create_test_service() -> TestService {
    let _ = env_logger::try_init();
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let cache = InMemoryCache::new();
    ChiptabService::new(storage, logging, cache, "test-secret".to_string())
}

pub async fn register(service: &TestService, name: &str) -> Player {
    let email = format!("{}@example.com", name.to_lowercase());
    service
        .register_player(name.to_string(), email, None, "hunter2".to_string(), None)
        .await
        .unwrap()
}

/// Registers the given players and puts them in one group, first player as
/// owner.
pub async fn setup_group(service: &TestService, names: &[&str]) -> (Group, Vec<Player>) {
    let mut players = Vec::new();
    for name in names {
        players.push(register(service, name).await);
    }
    let owner = players[0].clone();
    let group = service
        .create_group(
            "Friday Night Poker".to_string(),
            "$".to_string(),
            players.clone(),
            &owner,
        )
        .await
        .unwrap();
    (group, players)
}

/// Creates a session and walks every `(player, buy_in, cash_out)` entry
/// through buy-in and cash-out.
pub async fn run_session(
    service: &TestService,
    group: &Group,
    recorder: &Player,
    entries: &[(&Player, f64, f64)],
) -> Session {
    let session = service
        .create_session(&group.id, "Test Night".to_string(), None, recorder)
        .await
        .unwrap();
    for (player, buy_in, _) in entries {
        service
            .record_buy_in(&session.id, &player.id, *buy_in, recorder)
            .await
            .unwrap();
    }
    for (player, _, cash_out) in entries {
        service
            .record_cash_out(&session.id, &player.id, *cash_out, recorder)
            .await
            .unwrap();
    }
    service.get_session(&session.id).await.unwrap().unwrap()
}
