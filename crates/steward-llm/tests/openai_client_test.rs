use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;
use steward_llm::{
    CompletionClient, CompletionOptions, CompletionRequest, Message, OpenAIClient, OpenAIConfig,
    Role, RunEvent, RunProvider, RunRequest, Tool, ToolOutput,
};

fn client_for(server: &mockito::Server) -> OpenAIClient {
    let config = OpenAIConfig::new("sk-test")
        .with_base_url(server.url())
        .with_assistant_id("asst_1");
    OpenAIClient::from_config(config).unwrap()
}

const RUN_STREAM: &str = "event: thread.run.created\n\
data: {\"id\":\"run_1\",\"thread_id\":\"thread_1\",\"status\":\"queued\"}\n\
\n\
event: thread.message.delta\n\
data: {\"delta\":{\"content\":[{\"index\":0,\"type\":\"text\",\"text\":{\"value\":\"Hello \"}}]}}\n\
\n\
event: thread.message.delta\n\
data: {\"delta\":{\"content\":[{\"index\":0,\"type\":\"text\",\"text\":{\"value\":\"world\"}}]}}\n\
\n\
event: thread.run.completed\n\
data: {\"id\":\"run_1\",\"thread_id\":\"thread_1\",\"status\":\"completed\"}\n\
\n\
event: done\n\
data: [DONE]\n\
\n";

#[tokio::test]
async fn test_create_thread_sends_beta_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/threads")
        .match_header("openai-beta", "assistants=v2")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_body(r#"{"id":"thread_abc","object":"thread"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let thread_id = client.create_thread().await.unwrap();

    assert_eq!(thread_id, "thread_abc");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_append_message_posts_role_and_content() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/threads/thread_1/messages")
        .match_body(Matcher::PartialJson(json!({"role": "user", "content": "hi"})))
        .with_status(200)
        .with_body(r#"{"id":"msg_1"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .append_message("thread_1", Role::User, "hi")
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_run_streams_events() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/threads/thread_1/runs")
        .match_body(Matcher::PartialJson(json!({
            "assistant_id": "asst_1",
            "model": "gpt-4o",
            "stream": true,
            "instructions": "be brief"
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(RUN_STREAM)
        .create_async()
        .await;

    let client = client_for(&server);
    let request = RunRequest::new("thread_1", "gpt-4o")
        .with_instructions("be brief")
        .with_tools(vec![Tool::new("list_events", "List events", json!({"type": "object"}))]);

    let events: Vec<RunEvent> = client
        .create_run(request)
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            RunEvent::Other { kind: "thread.run.created".into() },
            RunEvent::text("Hello "),
            RunEvent::text("world"),
            RunEvent::Completed,
        ]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_tool_outputs_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/threads/thread_1/runs/run_1/submit_tool_outputs")
        .match_body(Matcher::PartialJson(json!({
            "tool_outputs": [{"tool_call_id": "c1", "output": "[]"}],
            "stream": true
        })))
        .with_status(200)
        .with_body("event: thread.run.completed\ndata: {\"id\":\"run_1\",\"thread_id\":\"thread_1\"}\n\n")
        .create_async()
        .await;

    let client = client_for(&server);
    let events: Vec<_> = client
        .submit_tool_outputs("thread_1", "run_1", vec![ToolOutput::new("c1", "[]")])
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].as_ref().unwrap(), &RunEvent::Completed);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/threads")
        .with_status(500)
        .with_body("upstream down")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.create_thread().await.unwrap_err();

    assert!(err.to_string().contains("500"));
    assert!(err.to_string().contains("upstream down"));
}

#[tokio::test]
async fn test_assistant_created_once() {
    let mut server = mockito::Server::new_async().await;
    let assistant = server
        .mock("POST", "/assistants")
        .with_status(200)
        .with_body(r#"{"id":"asst_new"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = OpenAIClient::from_config(OpenAIConfig::new("sk-test").with_base_url(server.url()))
        .unwrap();

    assert_eq!(client.assistant_id().await.unwrap(), "asst_new");
    assert_eq!(client.assistant_id().await.unwrap(), "asst_new");
    assistant.assert_async().await;
}

#[tokio::test]
async fn test_assistant_created_with_instructions_and_tools() {
    let mut server = mockito::Server::new_async().await;
    let assistant = server
        .mock("POST", "/assistants")
        .match_body(Matcher::PartialJson(json!({
            "name": "Steward",
            "model": "gpt-4o-mini",
            "instructions": "Be brief.",
            "tools": [{"type": "function", "function": {"name": "get_nodes"}}]
        })))
        .with_status(200)
        .with_body(r#"{"id":"asst_tools"}"#)
        .expect(1)
        .create_async()
        .await;

    let config = OpenAIConfig::new("sk-test")
        .with_base_url(server.url())
        .with_assistant_name("Steward");
    let client = OpenAIClient::from_config(config)
        .unwrap()
        .with_assistant_model("gpt-4o-mini")
        .with_assistant_instructions("Be brief.")
        .with_assistant_tools(vec![Tool::new(
            "get_nodes",
            "Return the tree",
            json!({"type": "object", "properties": {}}),
        )]);

    assert_eq!(client.assistant_id().await.unwrap(), "asst_tools");
    assistant.assert_async().await;
}

#[tokio::test]
async fn test_list_messages_oldest_first() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/threads/thread_1/messages")
        .match_query(Matcher::UrlEncoded("order".into(), "asc".into()))
        .with_status(200)
        .with_body(
            json!({
                "data": [
                    {"role": "user", "created_at": 1, "content": [{"type": "text", "text": {"value": "plan my week"}}]},
                    {"role": "assistant", "created_at": 2, "content": [{"type": "text", "text": {"value": "Sure"}}]}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let messages = client.list_messages("thread_1").await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].text, "plan my week");
    assert_eq!(messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn test_completion_json_mode() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "response_format": {"type": "json_object"}
        })))
        .with_status(200)
        .with_body(
            json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"ok\":true}"}, "finish_reason": "stop"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let request = CompletionRequest::new("gpt-4o-mini", vec![Message::human("hi")])
        .with_options(CompletionOptions::new().json_mode());
    let response = client.complete(request).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("{\"ok\":true}"));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    mock.assert_async().await;
}
