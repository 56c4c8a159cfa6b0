use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cite_chat::assistant::OpenAiAssistantClient;
use cite_chat::config::AssistantConfig;

#[allow(dead_code)]
pub const API_KEY: &str = "sk-test";

#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> OpenAiAssistantClient {
    let config = AssistantConfig {
        api_key: Some(API_KEY.to_string()),
        assistant_id: "asst_1".to_string(),
        api_base: server.uri(),
        request_timeout_seconds: 5,
    };
    OpenAiAssistantClient::new(&config).expect("failed to create client")
}

#[allow(dead_code)]
pub fn run_json(status: &str) -> Value {
    json!({
        "id": "run_1",
        "object": "thread.run",
        "thread_id": "thread_1",
        "assistant_id": "asst_1",
        "status": status
    })
}

#[allow(dead_code)]
pub fn assistant_message_json(value: &str, annotations: Value) -> Value {
    json!({
        "id": "msg_2",
        "object": "thread.message",
        "created_at": 1700000002,
        "thread_id": "thread_1",
        "role": "assistant",
        "run_id": "run_1",
        "content": [{
            "type": "text",
            "text": { "value": value, "annotations": annotations }
        }]
    })
}

#[allow(dead_code)]
pub fn user_message_json(value: &str) -> Value {
    json!({
        "id": "msg_1",
        "object": "thread.message",
        "created_at": 1700000001,
        "thread_id": "thread_1",
        "role": "user",
        "run_id": null,
        "content": [{
            "type": "text",
            "text": { "value": value, "annotations": [] }
        }]
    })
}

/// Mount a 200 response for one endpoint, requiring the API headers
#[allow(dead_code)]
pub async fn mount_json(server: &MockServer, verb: &str, route: &str, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("OpenAI-Beta", "assistants=v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a full successful turn: thread, message, run, statuses, listing, file
#[allow(dead_code)]
pub async fn mount_successful_turn(server: &MockServer, statuses: &[&str], listing: Value) {
    mount_json(server, "POST", "/threads", json!({ "id": "thread_1", "object": "thread" })).await;
    mount_json(
        server,
        "POST",
        "/threads/thread_1/messages",
        user_message_json("hello"),
    )
    .await;
    mount_json(server, "POST", "/threads/thread_1/runs", run_json("queued")).await;

    for status in statuses {
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/runs/run_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(run_json(status)))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }

    mount_json(server, "GET", "/threads/thread_1/messages", listing).await;
    mount_json(
        server,
        "GET",
        "/files/file-1",
        json!({ "id": "file-1", "object": "file", "filename": "brand-guide.pdf" }),
    )
    .await;
}
