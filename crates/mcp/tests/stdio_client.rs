//! The stdio server binary driven by the SDK's client session.

use serde_json::json;
use toolwire_sdk::protocol::Implementation;
use toolwire_sdk::{ClientSession, SdkError, StdioTransport};

async fn connect() -> ClientSession {
    let transport = StdioTransport::new(
        env!("CARGO_BIN_EXE_toolwire-stdio"),
        ["--name", "stdio-test"],
    );
    ClientSession::connect(transport, Implementation::new("stdio-test-client", "0.0.1"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_add_and_greeting_over_stdio() {
    let session = connect().await;
    assert_eq!(session.server_info().unwrap().name, "stdio-test");

    let sum = session.call_tool("add", json!({"a": 4, "b": 4})).await.unwrap();
    assert_eq!(sum.first_text(), Some("8"));

    let greeting = session.read_resource("greeting://Lucy").await.unwrap();
    assert_eq!(greeting.first_text(), Some("Hello, Lucy!"));
    assert_eq!(greeting.contents[0].uri, "greeting://Lucy");

    session.close().await.unwrap();
    session.close().await.unwrap();
    assert!(matches!(session.ping().await, Err(SdkError::ChannelClosed)));
}

#[tokio::test]
async fn test_errors_over_stdio() {
    let session = connect().await;

    let tools = session.list_tools().await.unwrap();
    assert_eq!(tools.tools[0].name, "add");

    let invalid = session.call_tool("add", json!({"a": "four"})).await.unwrap();
    assert!(invalid.is_error());

    match session.call_tool("subtract", json!({"a": 1, "b": 2})).await {
        Err(SdkError::Rpc { code, message }) => {
            assert_eq!(code, -32602);
            assert_eq!(message, "Tool subtract not found");
        }
        other => panic!("Expected invalid params, got {:?}", other),
    }

    match session.read_resource("sse-greeting://Lucy").await {
        Err(SdkError::Rpc { code, .. }) => assert_eq!(code, -32002),
        other => panic!("Expected resource not found, got {:?}", other),
    }

    session.close().await.unwrap();
}
