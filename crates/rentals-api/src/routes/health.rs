use axum::Json;
use serde_json::{Value, json};

use crate::envelope::{Envelope, ok};

pub(super) async fn health() -> Json<Envelope<Value>> {
    ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
