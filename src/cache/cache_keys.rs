pub fn session_settlement_key(session_id: &str) -> String {
    format!("session_settlement:{}", session_id)
}
