//! End-to-end tests over real TCP connections

use bytes::Bytes;
use ferrumkv::aof::{AofConfig, SyncPolicy};
use ferrumkv::{server, Dispatcher};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

async fn start(dispatcher: Arc<Dispatcher>) -> (SocketAddr, JoinHandle<anyhow::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server::serve(listener, dispatcher));
    (addr, handle)
}

async fn roundtrip(stream: &mut TcpStream, request: &[u8], expected: &[u8]) {
    stream.write_all(request).await.unwrap();
    let mut reply = vec![0u8; expected.len()];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(
        String::from_utf8_lossy(&reply),
        String::from_utf8_lossy(expected)
    );
}

fn aof_config(path: &Path) -> AofConfig {
    AofConfig {
        path: path.to_path_buf(),
        sync_policy: SyncPolicy::Always,
        enabled: true,
    }
}

#[tokio::test]
async fn test_literal_scenario() {
    let (addr, server) = start(Arc::new(Dispatcher::new())).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    roundtrip(&mut stream, b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n", b"+OK\r\n").await;
    roundtrip(&mut stream, b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n", b"$3\r\nbar\r\n").await;
    roundtrip(&mut stream, b"*2\r\n$3\r\nGET\r\n$7\r\nmissing\r\n", b"$-1\r\n").await;
    roundtrip(
        &mut stream,
        b"*4\r\n$4\r\nHSET\r\n$1\r\nh\r\n$1\r\nf\r\n$1\r\nv\r\n",
        b"+OK\r\n",
    )
    .await;
    roundtrip(
        &mut stream,
        b"*2\r\n$7\r\nHGETALL\r\n$1\r\nh\r\n",
        b"*2\r\n$1\r\nf\r\n$1\r\nv\r\n",
    )
    .await;

    server.abort();
}

#[tokio::test]
async fn test_unknown_command_then_valid_command() {
    let (addr, server) = start(Arc::new(Dispatcher::new())).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    roundtrip(&mut stream, b"*1\r\n$4\r\nNOPE\r\n", b"-ERR invalid command\r\n").await;
    roundtrip(&mut stream, b"*1\r\n$4\r\nping\r\n", b"+PONG\r\n").await;
    roundtrip(
        &mut stream,
        b"*2\r\n$4\r\nPING\r\n$5\r\nhello\r\n",
        b"+hello\r\n",
    )
    .await;

    server.abort();
}

#[tokio::test]
async fn test_pipelined_requests() {
    let (addr, server) = start(Arc::new(Dispatcher::new())).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    roundtrip(
        &mut stream,
        b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n",
        b"+OK\r\n$1\r\nv\r\n",
    )
    .await;

    server.abort();
}

#[tokio::test]
async fn test_protocol_error_closes_only_that_connection() {
    let (addr, server) = start(Arc::new(Dispatcher::new())).await;

    let mut bad = TcpStream::connect(addr).await.unwrap();
    let mut good = TcpStream::connect(addr).await.unwrap();

    bad.write_all(b"+hello\r\n").await.unwrap();
    let mut reply = Vec::new();
    bad.read_to_end(&mut reply).await.unwrap();
    assert!(reply.starts_with(b"-ERR Protocol error"));

    roundtrip(&mut good, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;

    server.abort();
}

#[tokio::test]
async fn test_concurrent_sets_never_interleave() {
    let dispatcher = Arc::new(Dispatcher::new());
    let (addr, server) = start(dispatcher.clone()).await;

    let a = "a".repeat(10_000);
    let b = "b".repeat(10_000);

    let mut writers = Vec::new();
    for value in [a.clone(), b.clone()] {
        writers.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let request = format!(
                "*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n${}\r\n{}\r\n",
                value.len(),
                value
            );
            for _ in 0..20 {
                roundtrip(&mut stream, request.as_bytes(), b"+OK\r\n").await;
            }
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }

    let value = dispatcher.store().get(b"key").unwrap();
    assert!(value == Bytes::from(a) || value == Bytes::from(b));

    server.abort();
}

#[tokio::test]
async fn test_restart_recovers_from_truncated_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("appendonly.aof");

    {
        let dispatcher = Arc::new(Dispatcher::with_aof(&aof_config(&path)).unwrap());
        let (addr, server) = start(dispatcher).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        roundtrip(&mut stream, b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n", b"+OK\r\n").await;
        roundtrip(
            &mut stream,
            b"*4\r\n$4\r\nHSET\r\n$1\r\nh\r\n$1\r\nf\r\n$1\r\nv\r\n",
            b"+OK\r\n",
        )
        .await;
        roundtrip(&mut stream, b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n", b"$3\r\nbar\r\n").await;

        server.abort();
    }

    // Simulate a crash in the middle of appending a third record
    let mut data = std::fs::read(&path).unwrap();
    data.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nqu");
    std::fs::write(&path, &data).unwrap();

    let dispatcher = Arc::new(Dispatcher::with_aof(&aof_config(&path)).unwrap());
    let (addr, server) = start(dispatcher).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    roundtrip(&mut stream, b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n", b"$3\r\nbar\r\n").await;
    roundtrip(
        &mut stream,
        b"*3\r\n$4\r\nHGET\r\n$1\r\nh\r\n$1\r\nf\r\n",
        b"$1\r\nv\r\n",
    )
    .await;

    server.abort();
}

#[tokio::test]
async fn test_idle_everysec_log_gets_synced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("everysec.aof");
    let dispatcher = Arc::new(
        Dispatcher::with_aof(&AofConfig {
            sync_policy: SyncPolicy::EverySec,
            ..aof_config(&path)
        })
        .unwrap(),
    );

    dispatcher.dispatch(ferrumkv::RespValue::command(["SET", "k", "v"]));
    server::spawn_aof_sync(dispatcher.clone());
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    let aof = dispatcher.aof().unwrap();
    assert!(!aof.sync_pending().unwrap());
}
