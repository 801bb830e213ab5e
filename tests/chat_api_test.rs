//! End-to-end chat turns through the HTTP router.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{count_rows, token_for, TestApp};
use taskchat::adapters::completion::ScriptedResponse;
use taskchat::domain::models::{Completion, PromptMessage};

#[tokio::test]
async fn test_add_task_in_new_conversation() {
    let app = TestApp::new().await;
    app.completion
        .push(ScriptedResponse::tool_calls([("add_task", json!({"title": "Buy groceries"}))]))
        .await;
    app.completion.push(ScriptedResponse::text("Added 'Buy groceries' to your list.")).await;

    let (status, body) = app.chat("alice", None, "Add a task to buy groceries").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["conversation_id"].as_i64().is_some());
    assert_eq!(body["response"], "Added 'Buy groceries' to your list.");
    let calls = body["tool_calls"].as_array().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["tool"], "add_task");
    assert_eq!(calls[0]["arguments"]["title"], "Buy groceries");
    assert_eq!(calls[0]["result"]["status"], "created");

    let (status, tasks) = app.get("/api/alice/tasks", &token_for("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Buy groceries");
    assert_eq!(tasks[0]["completed"], false);
}

#[tokio::test]
async fn test_complete_then_list_in_order() {
    let app = TestApp::new().await;
    let token = token_for("alice");
    let mut ids = Vec::new();
    for title in ["One", "Two", "Three", "Four", "Five"] {
        let (_, task) = app.post("/api/alice/tasks", &token, json!({"title": title})).await;
        ids.push(task["id"].as_i64().unwrap());
    }
    let target = ids[4];

    app.completion
        .push(ScriptedResponse::tool_calls([
            ("complete_task", json!({"task_id": target})),
            ("list_tasks", json!({"status": "pending"})),
        ]))
        .await;
    app.completion.push(ScriptedResponse::text("Done. Four tasks left.")).await;

    let (status, body) = app
        .chat("alice", None, &format!("Mark task {target} as complete and show me what's left"))
        .await;

    assert_eq!(status, StatusCode::OK);
    let calls = body["tool_calls"].as_array().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["tool"], "complete_task");
    assert_eq!(calls[0]["arguments"]["task_id"], target);
    assert_eq!(calls[0]["result"]["status"], "completed");
    assert_eq!(calls[1]["tool"], "list_tasks");
    assert_eq!(calls[1]["arguments"]["status"], "pending");
    assert_eq!(calls[1]["result"].as_array().unwrap().len(), 4);

    let (_, task) = app.get(&format!("/api/alice/tasks/{target}"), &token).await;
    assert_eq!(task["completed"], true);

    // Second request carried both tool results back to the model
    let requests = app.completion.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(matches!(
        requests[1].messages.last(),
        Some(PromptMessage::ToolResults(results)) if results.len() == 2
    ));
}

#[tokio::test]
async fn test_missing_task_is_reported_to_the_model() {
    let app = TestApp::new().await;
    app.completion
        .push(ScriptedResponse::tool_calls([("complete_task", json!({"task_id": 999}))]))
        .await;
    app.completion.push(ScriptedResponse::text("I couldn't find task 999.")).await;

    let (status, body) = app.chat("alice", None, "Complete task 999").await;

    assert_eq!(status, StatusCode::OK);
    let result = &body["tool_calls"][0]["result"];
    assert_eq!(result["error"], true);
    assert_eq!(result["kind"], "NotFound");
    assert_eq!(body["response"], "I couldn't find task 999.");
}

#[tokio::test]
async fn test_two_turns_share_a_conversation() {
    let app = TestApp::new().await;
    app.completion.push(ScriptedResponse::text("Hello!")).await;
    app.completion.push(ScriptedResponse::text("You have no tasks.")).await;

    let (_, first) = app.chat("alice", None, "Hi").await;
    let conversation_id = first["conversation_id"].as_i64().unwrap();
    let (status, second) = app.chat("alice", Some(conversation_id), "What are my tasks?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["conversation_id"], conversation_id);

    let (status, history) = app
        .get(&format!("/api/alice/conversations/{conversation_id}"), &token_for("alice"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let roles: Vec<&str> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, ["user", "assistant", "user", "assistant"]);

    // The second turn saw the first exchange as context
    let requests = app.completion.requests().await;
    assert_eq!(requests[1].messages.len(), 3);
}

#[tokio::test]
async fn test_upstream_failure_returns_503_and_keeps_user_message() {
    let app = TestApp::new().await;
    app.completion.push(ScriptedResponse::unavailable("connection refused")).await;

    let (status, body) = app.chat("alice", None, "Hello?").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "UpstreamUnavailable");
    assert!(!body["message"].as_str().unwrap().contains("connection refused"));
    assert_eq!(count_rows(&app.pool, "messages").await, 1);

    // The new conversation is reported so the retry lands in it
    let conversation_id = body["conversation_id"].as_i64().unwrap();
    app.completion.push(ScriptedResponse::text("Hello again.")).await;
    let (status, retry) = app.chat("alice", Some(conversation_id), "Hello?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retry["conversation_id"], conversation_id);
    assert_eq!(count_rows(&app.pool, "conversations").await, 1);
}

#[tokio::test]
async fn test_failure_before_conversation_exists_has_no_id() {
    let app = TestApp::new().await;

    let (status, body) = app.chat("alice", Some(99), "Hello?").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("conversation_id").is_none());
}

#[tokio::test]
async fn test_unknown_or_foreign_conversation_is_404_without_writes() {
    let app = TestApp::new().await;
    app.completion.push(ScriptedResponse::text("Hi Bob")).await;
    let (_, bobs) = app.chat("bob", None, "Hi").await;
    let bobs_conversation = bobs["conversation_id"].as_i64().unwrap();
    let before = count_rows(&app.pool, "messages").await;

    let (status, body) = app.chat("alice", Some(bobs_conversation), "Let me in").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NotFound");

    let (status, _) = app.chat("alice", Some(424_242), "Anyone?").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(count_rows(&app.pool, "messages").await, before);
    assert_eq!(app.completion.requests().await.len(), 1);
}

#[tokio::test]
async fn test_blank_message_is_400() {
    let app = TestApp::new().await;

    let (status, body) = app.chat("alice", None, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidInput");

    let (status, _) = app
        .post("/api/alice/chat", &token_for("alice"), json!({"conversation_id": 1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(count_rows(&app.pool, "conversations").await, 0);
}

#[tokio::test]
async fn test_empty_final_text_gets_a_fallback() {
    let app = TestApp::new().await;
    app.completion.push(ScriptedResponse::Reply(Completion::Final(String::new()))).await;

    let (status, body) = app.chat("alice", None, "Hi").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["response"].as_str().unwrap().is_empty());
    assert!(body["tool_calls"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_tools_never_reach_another_owner() {
    let app = TestApp::new().await;
    let (_, bobs_task) = app
        .post("/api/bob/tasks", &token_for("bob"), json!({"title": "Bob's secret"}))
        .await;
    let bobs_id = bobs_task["id"].as_i64().unwrap();

    app.completion
        .push(ScriptedResponse::tool_calls([
            ("delete_task", json!({"task_id": bobs_id})),
            ("list_tasks", json!({"user_id": "bob"})),
        ]))
        .await;
    app.completion.push(ScriptedResponse::text("Nothing to do.")).await;

    let (status, body) = app.chat("alice", None, "Delete Bob's task").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tool_calls"][0]["result"]["kind"], "NotFound");
    assert_eq!(body["tool_calls"][1]["result"]["error"], true);

    let (status, _) = app.get(&format!("/api/bob/tasks/{bobs_id}"), &token_for("bob")).await;
    assert_eq!(status, StatusCode::OK);
}
