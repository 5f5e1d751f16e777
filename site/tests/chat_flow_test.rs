//! Assistant chat driven through the runtime, against scripted backends and
//! a mock Messages API.

#![allow(clippy::unwrap_used)]

use bashi_anthropic::AnthropicClient;
use bashi_runtime::Store;
use bashi_site::chat::{
    AnthropicChatBackend, ChatAction, ChatBackend, ChatEntry, ChatEnvironment, ChatError, ChatReducer, ChatState,
    FragmentStream, Speaker, APOLOGY, GREETING,
};
use futures::stream;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

/// Replies with fixed fragments and records the history it was given
#[derive(Default)]
struct ScriptedBackend {
    fragments: Vec<&'static str>,
    fail_after: bool,
    seen: Mutex<Vec<Vec<ChatEntry>>>,
}

impl ChatBackend for ScriptedBackend {
    fn stream_reply(&self, history: Vec<ChatEntry>, _system: String) -> FragmentStream {
        self.seen.lock().unwrap().push(history);
        let mut items: Vec<Result<String, ChatError>> =
            self.fragments.iter().map(|f| Ok((*f).to_string())).collect();
        if self.fail_after {
            items.push(Err(ChatError::IdleTimeout(Duration::from_secs(60))));
        }
        Box::pin(stream::iter(items))
    }
}

fn chat_store(backend: Arc<dyn ChatBackend>) -> Store<ChatState, ChatAction, ChatEnvironment, ChatReducer> {
    Store::with_broadcast_capacity(ChatState::default(), ChatReducer, ChatEnvironment::new(backend), 256)
}

#[tokio::test]
async fn reply_is_streamed_into_transcript() {
    let backend = Arc::new(ScriptedBackend {
        fragments: vec!["Noboborsho is ", "the Bengali ", "New Year."],
        ..ScriptedBackend::default()
    });
    let store = chat_store(backend.clone());

    let mut handle = store
        .send(ChatAction::Submit {
            text: "What is Noboborsho?".to_string(),
        })
        .await
        .unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(|s| s.clone()).await;
    assert_eq!(state.transcript.len(), 3);
    assert_eq!(state.transcript[0].text, GREETING);
    assert_eq!(state.transcript[1].speaker, Speaker::User);
    assert_eq!(state.transcript[1].text, "What is Noboborsho?");
    assert_eq!(state.transcript[2].speaker, Speaker::Assistant);
    assert_eq!(state.transcript[2].text, "Noboborsho is the Bengali New Year.");
    assert!(!state.is_streaming);

    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].last().unwrap().text, "What is Noboborsho?");
}

#[tokio::test]
async fn failed_reply_shows_apology() {
    let store = chat_store(Arc::new(ScriptedBackend {
        fragments: vec!["Let me"],
        fail_after: true,
        ..ScriptedBackend::default()
    }));

    let mut handle = store
        .send(ChatAction::Submit {
            text: "Hello".to_string(),
        })
        .await
        .unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(|s| s.clone()).await;
    assert_eq!(state.transcript.len(), 3);
    assert_eq!(state.transcript[1].text, "Hello");
    assert_eq!(state.transcript[2].text, APOLOGY);
    assert!(!state.is_streaming);
}

#[tokio::test]
async fn conversation_continues_after_reply() {
    let backend = Arc::new(ScriptedBackend {
        fragments: vec!["Sure."],
        ..ScriptedBackend::default()
    });
    let store = chat_store(backend.clone());

    for text in ["First", "Second"] {
        let mut handle = store.send(ChatAction::Submit { text: text.to_string() }).await.unwrap();
        handle.wait_with_timeout(WAIT).await.unwrap();
    }

    assert_eq!(store.state(|s| s.transcript.len()).await, 5);
    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen[1].len(), 4);
}

#[tokio::test]
async fn anthropic_backend_streams_fragments() {
    let server = MockServer::start().await;
    let body = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"model\":\"claude-sonnet-4-5-20250929\",\"role\":\"assistant\"}}\n\n",
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Eid \"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Mubarak!\"}}\n\n",
        "event: content_block_stop\n",
        "data: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let client = AnthropicClient::new("test-key").with_api_url(format!("{}/v1", server.uri()));
    let store = chat_store(Arc::new(AnthropicChatBackend::new(client)));

    let mut handle = store.send(ChatAction::Submit { text: "Eid?".to_string() }).await.unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();

    let reply = store.state(|s| s.transcript.last().unwrap().text.clone()).await;
    assert_eq!(reply, "Eid Mubarak!");
}

#[tokio::test]
async fn anthropic_backend_error_becomes_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("{\"type\":\"error\",\"error\":{\"type\":\"api_error\",\"message\":\"boom\"}}"))
        .mount(&server)
        .await;

    let client = AnthropicClient::new("test-key").with_api_url(format!("{}/v1", server.uri()));
    let store = chat_store(Arc::new(AnthropicChatBackend::new(client)));

    let mut handle = store.send(ChatAction::Submit { text: "Hi".to_string() }).await.unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(|s| s.clone()).await;
    assert_eq!(state.transcript[2].text, APOLOGY);
    assert!(!state.is_streaming);
}

/// Sends the response head and `first` as one chunk, then goes quiet
async fn stalling_server(first: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0_u8; 8192];
        let _ = socket.read(&mut buf).await.unwrap();

        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n")
            .await
            .unwrap();
        socket.write_all(format!("{:x}\r\n{first}\r\n", first.len()).as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    format!("http://{addr}/v1")
}

#[tokio::test]
async fn stalled_reply_times_out_into_apology() {
    let first = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"model\":\"m\",\"role\":\"assistant\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Shubho \"}}\n\n",
    );
    let url = stalling_server(first).await;
    let backend = AnthropicChatBackend::new(AnthropicClient::new("test-key").with_api_url(url))
        .with_idle_timeout(Duration::from_millis(200));
    let store = chat_store(Arc::new(backend));

    let mut handle = store.send(ChatAction::Submit { text: "Greeting?".to_string() }).await.unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(|s| s.clone()).await;
    assert_eq!(state.transcript.len(), 3);
    assert_eq!(state.transcript[2].text, APOLOGY);
    assert!(!state.is_streaming);
}

#[tokio::test]
async fn slow_response_head_times_out_into_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = AnthropicClient::new("test-key").with_api_url(format!("{}/v1", server.uri()));
    let backend = AnthropicChatBackend::new(client).with_idle_timeout(Duration::from_millis(200));
    let store = chat_store(Arc::new(backend));

    let mut handle = store.send(ChatAction::Submit { text: "Hi".to_string() }).await.unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(|s| s.clone()).await;
    assert_eq!(state.transcript.last().unwrap().text, APOLOGY);
    assert!(!state.is_streaming);
}
