use std::time::Duration;

use bytes::BytesMut;
use redis_aof::{
    aof::CommandRecord,
    input::read_and_parse_resp,
    resp::RespValue,
    server::RedisServer,
};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    sync::oneshot,
    time::timeout,
};

use crate::test_utils::TestUtils;

async fn send_and_receive(
    client: &mut TcpStream,
    buffer: &mut BytesMut,
    commands: &[RespValue],
) -> Vec<RespValue> {
    let mut request = Vec::new();
    for command in commands {
        request.extend_from_slice(&command.encode());
    }
    client.write_all(&request).await.unwrap();
    client.flush().await.unwrap();

    let mut responses = Vec::new();
    while responses.len() < commands.len() {
        let values = timeout(Duration::from_secs(2), read_and_parse_resp(client, buffer))
            .await
            .expect("response should arrive within timeout")
            .unwrap();
        responses.extend(values);
    }

    responses
}

#[tokio::test]
async fn test_server_persists_client_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config = TestUtils::aof_config(dir.path());

    let server = RedisServer::open(config.clone()).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server.run(listener, async {
        let _ = stopped.await;
    }));

    let mut client = TcpStream::connect(address).await.unwrap();
    let mut buffer = BytesMut::new();

    let responses = send_and_receive(
        &mut client,
        &mut buffer,
        &[
            TestUtils::command(&["PING"]),
            TestUtils::set_command("grape", "mango"),
            TestUtils::get_command("grape"),
            TestUtils::command(&["CONFIG", "GET", "appendonly"]),
        ],
    )
    .await;

    assert_eq!(
        responses,
        vec![
            RespValue::SimpleString("PONG".to_string()),
            RespValue::SimpleString("OK".to_string()),
            RespValue::BulkString("mango".into()),
            RespValue::Array(vec![
                RespValue::BulkString("appendonly".into()),
                RespValue::BulkString("yes".into()),
            ]),
        ]
    );

    let responses = send_and_receive(
        &mut client,
        &mut buffer,
        &[RespValue::SimpleString("PING".to_string())],
    )
    .await;
    assert_eq!(
        responses,
        vec![RespValue::Error("ERR Invalid command".to_string())]
    );

    drop(client);
    stop.send(()).unwrap();
    timeout(Duration::from_secs(5), server_task)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();

    assert_eq!(
        TestUtils::read_records(&config.aof_path()).await,
        vec![CommandRecord::new("SET", ["grape", "mango"])]
    );
}
