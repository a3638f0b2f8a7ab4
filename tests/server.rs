use std::net::SocketAddr;

use restkit::{Error, Listing, Method, Request, Response, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn app(req: Request) -> Result<Response, Error> {
    match req.method() {
        Method::Get => {
            let mut listing = Listing::negotiate(&req, None);
            listing.line("a.txt", &[("Size", "3")]);
            Ok(listing.end())
        }
        Method::Delete => Ok(Response::text(format!("deleted {}", req.uri()))),
        _ => {
            req.require_method(&[Method::Get, Method::Delete])?;
            unreachable!()
        }
    }
}

type Running = (SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<Result<(), Error>>);

async fn start() -> Running {
    start_with(Server::bind("127.0.0.1:0").server_name("files.example.org")).await
}

async fn start_with(server: Server) -> Running {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_listener(listener, app, async {
        let _ = rx.await;
    }));
    (addr, tx, handle)
}

async fn roundtrip(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_negotiated_listing_over_http() {
    let (addr, tx, handle) = start().await;

    let res = roundtrip(
        addr,
        "GET /files/ HTTP/1.1\r\nHost: localhost\r\nAccept: text/csv\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(res.to_ascii_lowercase().contains("content-type: text/csv; charset=utf-8"));
    assert!(res.ends_with("\"Name\",\"Size\"\r\n\"a.txt\",\"3\"\r\n"));

    let res = roundtrip(
        addr,
        "GET /files/ HTTP/1.1\r\nHost: localhost\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(res.ends_with(r#"[{"Size":"3","Name":"a.txt"}]"#));

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_spoofed_delete_reaches_handler() {
    let (addr, tx, handle) = start().await;

    let res = roundtrip(
        addr,
        "POST /files/a.txt?http_method=delete&v=1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(res.ends_with("deleted /files/a.txt?v=1"));

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_method_errors() {
    let (addr, tx, handle) = start().await;

    let res = roundtrip(addr, "PUT /x HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(res.to_ascii_lowercase().contains("allow: get, delete"));

    let res = roundtrip(
        addr,
        "POST /x?http_method=bogus HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(res.contains("Unknown method BOGUS."));

    let res = roundtrip(addr, "BREW /pot HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (addr, tx, handle) = start_with(Server::bind("127.0.0.1:0").body_limit(16)).await;

    let body = "x".repeat(64);
    let res = roundtrip(
        addr,
        &format!(
            "POST /files/a.txt?http_method=DELETE HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len(),
        ),
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 413 "));
    assert!(!res.contains("deleted"));

    let res = roundtrip(
        addr,
        "POST /files/a.txt?http_method=DELETE HTTP/1.1\r\nHost: localhost\r\nContent-Length: 8\r\nConnection: close\r\n\r\nsmallish",
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
