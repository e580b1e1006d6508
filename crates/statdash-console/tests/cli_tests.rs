use serde_json::{json, Value};

use statdash_client::mock::{MockDashboardApi, Scripted};
use statdash_console::cli::{run_chat, run_filter, run_ping};
use statdash_protocol::{ChatReply, FilterCriteria, FilterField, FilterResponse, CHAT_FAILURE_TEXT};

fn rows(values: Vec<Value>) -> Vec<serde_json::Map<String, Value>> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn filter_prints_table_and_count() {
    let api = MockDashboardApi::new();
    api.push_filter(Scripted::reply(FilterResponse::ok(rows(vec![
        json!({"district_name": "Pune", "sector": "Urban"}),
        json!({"district_name": "Nashik", "sector": "Rural"}),
    ]))));

    let mut criteria = FilterCriteria::new();
    criteria.set(FilterField::StateName, "Maharashtra");
    let mut out = Vec::new();
    let code = run_filter(&api, &criteria, &mut out).await.unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(code, 0);
    let first_line = text.lines().next().unwrap();
    assert!(first_line.starts_with("district_name"));
    assert!(first_line.contains("sector"));
    assert!(text.contains("Nashik"));
    assert!(text.contains("Results (2 records)"));
    assert_eq!(api.filter_calls()[0], criteria);
}

#[tokio::test]
async fn filter_failure_exits_nonzero() {
    let api = MockDashboardApi::new();
    api.push_filter(Scripted::status(400, Some("unknown state")));

    let mut out = Vec::new();
    let code = run_filter(&api, &FilterCriteria::new(), &mut out)
        .await
        .unwrap();

    assert_eq!(code, 1);
    assert_eq!(String::from_utf8(out).unwrap(), "Error: unknown state\n");
}

#[tokio::test]
async fn filter_with_no_rows() {
    let api = MockDashboardApi::new();
    api.push_filter(Scripted::reply(FilterResponse::ok(Vec::new())));

    let mut out = Vec::new();
    let code = run_filter(&api, &FilterCriteria::new(), &mut out)
        .await
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "No records matched.\n");
}

#[tokio::test]
async fn chat_prints_reply() {
    let api = MockDashboardApi::new();
    api.push_chat(Scripted::reply(ChatReply {
        response: "Hello!".to_string(),
    }));

    let mut out = Vec::new();
    let code = run_chat(&api, "analyst", "hi there", &mut out)
        .await
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "Hello!\n");
    let calls = api.chat_calls();
    assert_eq!(calls[0].user_id, "analyst");
    assert_eq!(calls[0].message, "hi there");
}

#[tokio::test]
async fn chat_failure_prints_fallback() {
    let api = MockDashboardApi::new();
    api.push_chat(Scripted::malformed());

    let mut out = Vec::new();
    let code = run_chat(&api, "default", "hi", &mut out).await.unwrap();

    assert_eq!(code, 1);
    assert_eq!(String::from_utf8(out).unwrap(), format!("{CHAT_FAILURE_TEXT}\n"));
}

#[tokio::test]
async fn blank_chat_message_is_not_sent() {
    let api = MockDashboardApi::new();

    let mut out = Vec::new();
    let code = run_chat(&api, "default", "   ", &mut out).await.unwrap();

    assert_eq!(code, 2);
    assert!(api.chat_calls().is_empty());
}

#[tokio::test]
async fn ping_reports_welcome_message() {
    let api = MockDashboardApi::new();

    let mut out = Vec::new();
    let code = run_ping(&api, &mut out).await.unwrap();

    assert_eq!(code, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "Backend reachable: mock backend\n");
}
