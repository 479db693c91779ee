use crate::AppState;

/// Reels report of the running machine.
pub async fn reels_report(state: &AppState) -> String {
    state.slot_machine.read().await.reels_report()
}
