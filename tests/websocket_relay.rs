//! End-to-end relay tests over real WebSocket connections

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use tree_relay::protocol::{decode_outbound, OutboundMessage};
use tree_relay::{ProducerConfig, RelayServer, RoomId, ServerConfig, StepEvent, TraceProducer};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    start_server_with(|config| config).await
}

async fn start_server_with(configure: impl FnOnce(ServerConfig) -> ServerConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = RelayServer::new(configure(ServerConfig::with_addr(addr)));

    tokio::spawn(async move {
        let _ = server.serve(listener, std::future::pending()).await;
    });

    addr
}

async fn open(addr: SocketAddr, namespace: &str) -> Client {
    let (socket, _) = connect_async(format!("ws://{}/ws/{}", addr, namespace))
        .await
        .unwrap();
    socket
}

async fn recv(client: &mut Client) -> OutboundMessage {
    loop {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .unwrap();

        if let Message::Text(text) = frame {
            return decode_outbound(&text).unwrap();
        }
    }
}

fn room(id: &str) -> RoomId {
    RoomId::new(id).unwrap()
}

#[tokio::test]
async fn test_producer_to_viewer_flow() {
    let addr = start_server().await;

    let mut status = open(addr, "status").await;
    assert_eq!(recv(&mut status).await, OutboundMessage::Rooms(vec![]));

    let config = ProducerConfig::new(format!("ws://{}", addr)).room(room("treeA"));
    let mut producer = TraceProducer::connect(config, json!({"id": 1, "children": []}))
        .await
        .unwrap();
    assert!(producer.is_connected());

    assert_eq!(recv(&mut status).await, OutboundMessage::Rooms(vec![room("treeA")]));

    let mut viewer = open(addr, "display").await;
    viewer
        .send(Message::Text(r#"["join room","treeA"]"#.into()))
        .await
        .unwrap();

    match recv(&mut viewer).await {
        OutboundMessage::Tree(Some(tree)) => assert_eq!(*tree, json!({"id": 1, "children": []})),
        other => panic!("expected tree, got {:?}", other),
    }

    producer.step(1, None).await.unwrap();
    producer.step(2, Some(json!("yielded"))).await.unwrap();
    producer.step(3, Some(json!(null))).await.unwrap();

    assert_eq!(recv(&mut viewer).await, OutboundMessage::Step(StepEvent::new(1)));
    assert_eq!(
        recv(&mut viewer).await,
        OutboundMessage::Step(StepEvent::new(2).with_value("yielded"))
    );
    assert_eq!(
        recv(&mut viewer).await,
        OutboundMessage::Step(StepEvent::new(3).with_value(json!(null)))
    );

    producer.close().await.unwrap();
    assert!(!producer.is_connected());
}

#[tokio::test]
async fn test_join_unknown_room_receives_null_tree() {
    let addr = start_server().await;

    let mut viewer = open(addr, "display").await;
    viewer
        .send(Message::Text(r#"["join room","ghost"]"#.into()))
        .await
        .unwrap();

    assert_eq!(recv(&mut viewer).await, OutboundMessage::Tree(None));
}

#[tokio::test]
async fn test_reintroduce_reaches_joined_viewers() {
    let addr = start_server().await;

    let config = ProducerConfig::new(format!("ws://{}", addr)).room(room("treeB"));
    let mut producer = TraceProducer::connect(config, json!({"v": 1})).await.unwrap();

    let mut viewer = open(addr, "display").await;
    viewer
        .send(Message::Text(r#"["join room","treeB"]"#.into()))
        .await
        .unwrap();
    assert!(matches!(recv(&mut viewer).await, OutboundMessage::Tree(Some(_))));

    producer.introduce(json!({"v": 2})).await.unwrap();

    match recv(&mut viewer).await {
        OutboundMessage::Tree(Some(tree)) => assert_eq!(*tree, json!({"v": 2})),
        other => panic!("expected tree, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_namespace_is_rejected() {
    let addr = start_server().await;

    let result = connect_async(format!("ws://{}/ws/nope", addr)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_plain_get_under_ws_prefix_serves_room_page() {
    let public_dir = std::env::temp_dir().join(format!("tree-relay-public-{}", std::process::id()));
    tokio::fs::create_dir_all(&public_dir).await.unwrap();
    tokio::fs::write(public_dir.join("tree.html"), "room page").await.unwrap();

    let dir = public_dir.clone();
    let addr = start_server_with(move |config| config.public_dir(dir)).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /ws/status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    timeout(Duration::from_secs(5), stream.read_to_string(&mut response))
        .await
        .expect("timed out waiting for a response")
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with("room page"));

    let _ = tokio::fs::remove_dir_all(&public_dir).await;
}
