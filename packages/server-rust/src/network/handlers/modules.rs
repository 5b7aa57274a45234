//! `GET /modules`: the routable module table.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;

/// Lists every launchable module and its channel, in table order.
pub async fn modules_handler(State(state): State<AppState>) -> Json<Value> {
    let modules: Vec<Value> = state
        .registry
        .routes()
        .iter()
        .map(|route| json!({"module": route.module, "channel": route.channel}))
        .collect();
    Json(json!({ "modules": modules }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::handlers::testing::ready_state;

    #[tokio::test]
    async fn lists_routes_in_table_order() {
        let Json(body) = modules_handler(State(ready_state())).await;
        let modules = body["modules"].as_array().unwrap();
        assert_eq!(modules.len(), 5);
        assert_eq!(modules[0]["module"], "alpha-fold");
        assert_eq!(modules[0]["channel"], "rad-lab-launch-alpha-fold");
        assert_eq!(modules[4]["module"], "silicon-design");
    }
}
