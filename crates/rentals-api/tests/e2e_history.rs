use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use rentals_api::{AppState, router};
use rentals_core::clock::ManualClock;
use rentals_core::config::RentalsConfig;
use rentals_core::{Rentals, ServiceContext};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new(config: &RentalsConfig) -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 4, 2, 8, 0, 0)
            .single()
            .expect("valid time");
        let clock = Arc::new(ManualClock::new(start));
        let ctx = ServiceContext::in_memory(clock.clone());
        Self {
            app: router(AppState::new(Rentals::new(&ctx, config))),
            clock,
        }
    }

    async fn raw(
        &self,
        method: Method,
        uri: &str,
        actor: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", actor);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        actor: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let res = self.raw(method, uri, actor, body).await;
        let status = res.status();
        let bytes = res.into_body().collect().await.expect("body").to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get(&self, uri: &str, actor: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, actor, None).await
    }

    /// Registers a property, links a contract, moves a tenant in and
    /// adjusts the rent, one day apart. Returns the property id.
    async fn seeded(&self) -> String {
        let (status, created) = self
            .call(
                Method::POST,
                "/properties",
                "ana",
                Some(json!({
                    "property_type": "apartment",
                    "address": "Av. Sete de Setembro, 1500",
                    "neighborhood": "Vitória",
                    "postal_code": "40080-001",
                    "city": "Salvador",
                    "state": "BA",
                    "bedrooms": 3,
                    "bathrooms": 2,
                    "area_m2": 110.0,
                    "rent_value": 4200.0
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_str().expect("id").to_string();

        self.clock.advance(Duration::days(1));
        let (status, _) = self
            .call(
                Method::POST,
                &format!("/properties/{id}/events"),
                "bia",
                Some(json!({
                    "event_type": "contract_linked",
                    "description": "Contract CT-88 signed",
                    "metadata": { "contract_id": "CT-88" }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        self.clock.advance(Duration::days(1));
        let (status, _) = self
            .call(
                Method::POST,
                &format!("/properties/{id}/events"),
                "bia",
                Some(json!({ "event_type": "tenant_move_in", "description": "Keys delivered" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        self.clock.advance(Duration::days(1));
        let (status, _) = self
            .call(
                Method::PATCH,
                &format!("/properties/{id}"),
                "ana",
                Some(json!({ "rent_value": 4350.0, "reason": "IGP-M adjustment" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        id
    }
}

#[tokio::test]
async fn history_returns_timeline_with_summary() {
    let h = Harness::new(&RentalsConfig::default());
    let id = h.seeded().await;

    let (status, body) = h.get(&format!("/properties/{id}/history"), "auditor").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["property_code"], "PROP-20250402-001");
    assert_eq!(data["total"], 5);
    assert_eq!(data["summary"]["total_events"], 3);
    assert_eq!(data["summary"]["total_changes"], 2);
    assert_eq!(data["entries"][0]["kind"], "change");
    assert_eq!(data["entries"][0]["field"], "rent_value");
    assert_eq!(data["entries"][4]["kind"], "event");
    assert_eq!(data["entries"][4]["event_type"], "created");
}

#[tokio::test]
async fn history_filters_combine() {
    let h = Harness::new(&RentalsConfig::default());
    let id = h.seeded().await;

    let history = format!("/properties/{id}/history");

    let events = format!("{history}?include=events&event_types=contract_linked,tenant_move_in");
    let (_, body) = h.get(&events, "auditor").await;
    assert_eq!(body["data"]["total"], 2);

    let by_ana = format!("{history}?actor=ana&include=changes");
    let (_, body) = h.get(&by_ana, "auditor").await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["entries"][0]["reason"], "IGP-M adjustment");

    let range = format!("{history}?from=2025-04-03&to=2025-04-04");
    let (_, body) = h.get(&range, "auditor").await;
    assert_eq!(body["data"]["total"], 3);

    // Field and event criteria together keep both kinds.
    let mixed = format!("{history}?fields=rent_value&event_types=contract_linked");
    let (_, body) = h.get(&mixed, "auditor").await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn history_rejects_bad_filters() {
    let h = Harness::new(&RentalsConfig::default());
    let id = h.seeded().await;

    let history = format!("/properties/{id}/history");

    let inverted = format!("{history}?from=2025-05-01&to=2025-04-01");
    let (status, body) = h.get(&inverted, "auditor").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["code"], "invalid_range");

    let (status, _) = h.get(&format!("{history}?fields=colour"), "auditor").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn field_provenance_reports_last_change() {
    let h = Harness::new(&RentalsConfig::default());
    let id = h.seeded().await;

    let fields = format!("/properties/{id}/history/fields");

    let (status, body) = h.get(&format!("{fields}/rent_value"), "auditor").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["last_changed_by"], "ana");
    assert_eq!(body["data"]["change_count"], 1);
    assert_eq!(body["data"]["current_value"], json!(4350.0));

    let (status, body) = h.get(&format!("{fields}/bedrooms"), "auditor").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["error_code"], "E3001");
}

#[tokio::test]
async fn csv_export_is_an_attachment() {
    let h = Harness::new(&RentalsConfig::default());
    let id = h.seeded().await;

    let res = h
        .raw(
            Method::GET,
            &format!("/properties/{id}/history/export?format=csv"),
            "auditor",
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()[header::CONTENT_TYPE].to_str().expect("ascii");
    assert!(content_type.starts_with("text/csv"));
    let disposition = res.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii")
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"history-PROP-20250402-001-"));
    assert!(disposition.ends_with(".csv\""));

    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    let mut lines = text.lines();
    let header_line = lines.next().expect("header");
    assert!(header_line.starts_with("kind,id,at,actor"));
    assert_eq!(lines.count(), 5);
}

#[tokio::test]
async fn oversized_export_is_refused() {
    let mut config = RentalsConfig::default();
    config.history.max_export_records = 2;
    let h = Harness::new(&config);
    let id = h.seeded().await;

    let export = format!("/properties/{id}/history/export");
    let (status, body) = h.get(&export, "auditor").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"]["limit"], 2);
}

#[tokio::test]
async fn consultations_land_in_the_audit_trail() {
    let h = Harness::new(&RentalsConfig::default());
    let id = h.seeded().await;

    h.get(&format!("/properties/{id}/history"), "carla").await;
    h.clock.advance(Duration::minutes(5));
    let export = format!("/properties/{id}/history/export?format=jsonl");
    h.raw(Method::GET, &export, "davi", None).await;

    let audit = format!("/properties/{id}/audit");
    let (status, body) = h.get(&audit, "auditor").await;
    assert_eq!(status, StatusCode::OK);
    let trail = body["data"].as_array().expect("trail");
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0]["consulted_by"], "davi");
    assert_eq!(trail[1]["consulted_by"], "carla");

    let (_, body) = h.get(&format!("{audit}?limit=1"), "auditor").await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn history_of_unknown_property_is_not_audited() {
    let h = Harness::new(&RentalsConfig::default());
    let missing = uuid::Uuid::new_v4();
    let history = format!("/properties/{missing}/history");
    let (status, _) = h.get(&history, "carla").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let audit = format!("/properties/{missing}/audit");
    let (status, _) = h.get(&audit, "carla").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recent_activity_spans_properties() {
    let h = Harness::new(&RentalsConfig::default());
    h.seeded().await;

    let (status, body) = h.get("/history/recent?limit=3", "auditor").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().expect("entries");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["field"], "rent_value");

    let (_, body) = h.get("/history/recent?actor=bia", "auditor").await;
    let entries = body["data"].as_array().expect("entries");
    assert!(!entries.is_empty());
    let by_bia = |e: &Value| e["recorded_by"] == "bia" || e["changed_by"] == "bia";
    assert!(entries.iter().all(by_bia));
}
