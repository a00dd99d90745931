use bytes::Buf;
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use http::{HeaderValue, Method};
use micro_response::config::ResponseConfig;
use micro_response::connection::BufConn;
use micro_response::pool::Pools;
use micro_response::protocol::{RequestInfo, ResponseError};
use micro_response::response::Response;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const MAX_HEADERS: usize = 64;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let pools = Arc::new(Pools::new(ResponseConfig::new().with_max_idle(256)));

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    loop {
        let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let pools = Arc::clone(&pools);
        tokio::spawn(async move {
            match serve(tcp_stream, &pools).await {
                Ok(()) => info!("finished process, connection shutdown"),
                Err(e) => error!(cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}

#[derive(Debug)]
struct Parsed {
    method: Method,
    path: String,
    keep_alive: bool,
}

/// Serves requests without bodies until the peer leaves or a response closes the connection.
async fn serve(tcp_stream: TcpStream, pools: &Arc<Pools>) -> Result<(), ResponseError> {
    let mut conn = BufConn::new(tcp_stream, pools);

    loop {
        let Some(request) = read_request(&mut conn).await? else {
            conn.release(pools);
            return Ok(());
        };

        let mut response = Response::new(pools, RequestInfo::new(request.method.clone()), conn);
        if !request.keep_alive {
            response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
        }

        let handled = route(&request.path, &mut response).await;
        if let Err(e) = &handled {
            warn!(cause = %e, path = %request.path, "handler error");
        }
        if response.is_hijacked() {
            drop(response.release());
            return Ok(());
        }

        response.finish_request().await?;
        conn = match response.release() {
            Some(conn) if request.keep_alive => conn,
            Some(conn) => {
                conn.release(pools);
                return Ok(());
            }
            None => return Ok(()),
        };
    }
}

async fn read_request(conn: &mut BufConn<TcpStream>) -> Result<Option<Parsed>, ResponseError> {
    loop {
        if !conn.read_buf().is_empty() {
            let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
            let mut request = httparse::Request::new(&mut headers);
            match request.parse(conn.read_buf()) {
                Ok(httparse::Status::Complete(header_len)) => {
                    let method = Method::from_bytes(request.method.unwrap_or("GET").as_bytes()).unwrap_or(Method::GET);
                    let path = request.path.unwrap_or("/").to_string();
                    let keep_alive = !request
                        .headers
                        .iter()
                        .any(|h| h.name.eq_ignore_ascii_case("connection") && h.value.eq_ignore_ascii_case(b"close"));
                    conn.read_buf_mut().advance(header_len);
                    return Ok(Some(Parsed { method, path, keep_alive }));
                }
                Ok(httparse::Status::Partial) => {}
                Err(e) => {
                    warn!(cause = %e, "invalid request header");
                    return Ok(None);
                }
            }
        }

        if conn.fill().await.map_err(ResponseError::io)? == 0 {
            return Ok(None);
        }
    }
}

async fn route(path: &str, response: &mut Response<TcpStream>) -> Result<(), ResponseError> {
    match path {
        "/" => {
            response.write(b"Hello World!\r\n").await?;
        }
        "/html" => {
            response.write(b"<!DOCTYPE html><html><body><h1>micro-response</h1></body></html>").await?;
        }
        "/json" => {
            response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response.write(br#"{"hello": "world"}"#).await?;
        }
        "/large" => {
            let line = [b'x'; 1023];
            for _ in 0..64 {
                response.write(&line).await?;
                response.write(b"\n").await?;
            }
        }
        "/chunked" => {
            response.headers_mut().insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            for word in ["hello", " ", "chunked", " ", "world\n"] {
                response.write(word.as_bytes()).await?;
                response.flush().await?;
            }
        }
        "/fixed" => {
            response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(5));
            response.write(b"12345").await?;
        }
        "/empty" => response.write_header(204),
        "/hijack" => {
            let mut conn = response.hijack().await?;
            conn.get_mut().write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\nhijacked\n").await?;
            conn.get_mut().shutdown().await?;
        }
        _ => {
            response.write_header(404);
            response.write(b"not found\n").await?;
        }
    }
    Ok(())
}
