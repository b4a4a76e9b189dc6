//! Server integration tests over a real TCP socket.

use std::net::SocketAddr;

use strand_core::{handler_fn, ResponseWriterExt};
use strand_middleware::stages::{real_ip, RealIp};
use strand_middleware::Chain;
use strand_server::{Server, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_serves_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Chain::new().append(RealIp).then(handler_fn(|ctx, w, req| {
        let reply = format!("{} from {}", req.uri().path(), real_ip(&ctx).split(':').next().unwrap_or_default());
        Box::pin(async move { w.write_all(reply.as_bytes()) })
    }));

    let (stop, stopped) = oneshot::channel::<()>();
    let server = Server::from_boxed(ServerConfig::default(), app);
    let running = tokio::spawn(server.serve(listener, async {
        let _ = stopped.await;
    }));

    let response = get(addr, "/hello").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.ends_with("/hello from 127.0.0.1"), "{response}");

    stop.send(()).unwrap();
    running.await.unwrap().unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let server = Server::new(
        ServerConfig::builder().http_addr(addr).build(),
        handler_fn(|_ctx, _w, _req| Box::pin(async { Ok(()) })),
    );
    let err = server
        .run_with_shutdown(std::future::ready(()))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to bind"), "{err}");
}
