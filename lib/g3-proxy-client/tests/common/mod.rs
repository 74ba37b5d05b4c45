/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

#![allow(dead_code)]

use std::convert::Infallible;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use g3_proxy_client::dial::BoxTunnelStream;
use g3_proxy_client::ss::{SsServerDescriptor, TunnelCipher};
use g3_socks::v5::{self, Socks5Reply, Socks5Request};
use g3_socks::SocksAuthMethod;
use g3_types::net::{Host, UpstreamAddr};

pub const TARGET_BODY: &str = "Hello from target server";

async fn bind_local() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

async fn connect_upstream(addr: &UpstreamAddr) -> io::Result<TcpStream> {
    match addr.host() {
        Host::Ip(ip) => TcpStream::connect(SocketAddr::new(*ip, addr.port())).await,
        Host::Domain(domain) => TcpStream::connect((domain.as_str(), addr.port())).await,
    }
}

async fn hello(_req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(Response::new(Full::new(Bytes::from_static(
        TARGET_BODY.as_bytes(),
    ))))
}

/// Spawn a http server that answers every request with [`TARGET_BODY`].
pub async fn spawn_target_server() -> SocketAddr {
    let (listener, addr) = bind_local().await;
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(hello))
                    .await;
            });
        }
    });
    addr
}

/// Spawn a tcp server that echoes back everything it reads.
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = bind_local().await;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut r, mut w) = stream.split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
            });
        }
    });
    addr
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub connections: Arc<AtomicUsize>,
    pub targets: Arc<Mutex<Vec<UpstreamAddr>>>,
}

impl MockServer {
    fn new(addr: SocketAddr) -> Self {
        MockServer {
            addr,
            connections: Arc::new(AtomicUsize::new(0)),
            targets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    /// The targets requested by clients, in order.
    pub fn targets(&self) -> Vec<UpstreamAddr> {
        self.targets.lock().unwrap().clone()
    }
}

#[derive(Clone, Copy)]
pub enum Socks5Mode {
    NoAuth,
    /// Require username/password auth with these credentials.
    User(&'static str, &'static str),
    /// Send this reply to every connect request.
    Reject(Socks5Reply),
}

async fn socks5_user_auth<R, W>(r: &mut R, w: &mut W, user: &str, pass: &str) -> io::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut hdr = [0u8; 2];
    r.read_exact(&mut hdr).await?;
    let mut username = vec![0u8; hdr[1] as usize];
    r.read_exact(&mut username).await?;
    let plen = r.read_u8().await?;
    let mut password = vec![0u8; plen as usize];
    r.read_exact(&mut password).await?;

    if hdr[0] == 0x01 && username == user.as_bytes() && password == pass.as_bytes() {
        w.write_all(&[0x01, 0x00]).await?;
        Ok(())
    } else {
        w.write_all(&[0x01, 0x01]).await?;
        Err(io::Error::other("auth failed"))
    }
}

async fn socks5_serve(
    mut stream: TcpStream,
    mode: Socks5Mode,
    targets: Arc<Mutex<Vec<UpstreamAddr>>>,
) -> io::Result<()> {
    let (mut r, mut w) = stream.split();
    let methods = v5::auth::recv_methods_from_client(&mut r)
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;
    match mode {
        Socks5Mode::User(user, pass) => {
            if !methods.contains(&SocksAuthMethod::User) {
                v5::auth::send_method_to_client(&mut w, SocksAuthMethod::NoAcceptable).await?;
                return Err(io::Error::other("no user auth offered"));
            }
            v5::auth::send_method_to_client(&mut w, SocksAuthMethod::User).await?;
            socks5_user_auth(&mut r, &mut w, user, pass).await?;
        }
        _ => v5::auth::send_method_to_client(&mut w, SocksAuthMethod::None).await?,
    }
    let req = Socks5Request::recv(&mut r)
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;
    targets.lock().unwrap().push(req.upstream.clone());

    if let Socks5Mode::Reject(reply) = mode {
        reply.send(&mut w).await?;
        return Ok(());
    }
    let mut ups = match connect_upstream(&req.upstream).await {
        Ok(ups) => ups,
        Err(e) => {
            Socks5Reply::ConnectionRefused.send(&mut w).await?;
            return Err(e);
        }
    };
    Socks5Reply::succeeded_unspecified().send(&mut w).await?;
    tokio::io::copy_bidirectional(&mut stream, &mut ups).await?;
    Ok(())
}

/// Spawn a socks5 proxy without authentication.
pub async fn spawn_socks5_server() -> MockServer {
    spawn_socks5_server_with(Socks5Mode::NoAuth).await
}

pub async fn spawn_socks5_server_with(mode: Socks5Mode) -> MockServer {
    let (listener, addr) = bind_local().await;
    let server = MockServer::new(addr);
    let counter = server.connections.clone();
    let targets = server.targets.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::Relaxed);
            tokio::spawn(socks5_serve(stream, mode, targets.clone()));
        }
    });
    server
}

async fn read_nul_terminated<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    reader.read_until(0, &mut buf).await?;
    if buf.pop() != Some(0) {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(buf)
}

async fn socks4_serve(stream: TcpStream, grant: bool) -> io::Result<()> {
    let mut reader = BufReader::new(stream);
    let mut hdr = [0u8; 8];
    reader.read_exact(&mut hdr).await?;
    let port = u16::from_be_bytes([hdr[2], hdr[3]]);
    let ip = Ipv4Addr::new(hdr[4], hdr[5], hdr[6], hdr[7]);
    let _user_id = read_nul_terminated(&mut reader).await?;
    let target = if ip.octets()[..3] == [0, 0, 0] && ip.octets()[3] != 0 {
        let domain = read_nul_terminated(&mut reader).await?;
        let domain = String::from_utf8(domain).map_err(io::Error::other)?;
        UpstreamAddr::from_host_str_and_port(&domain, port).map_err(io::Error::other)?
    } else {
        UpstreamAddr::from_ip_and_port(IpAddr::V4(ip), port)
    };

    let mut stream = reader.into_inner();
    if !grant {
        stream.write_all(&[0x00, 91, 0, 0, 0, 0, 0, 0]).await?;
        return Ok(());
    }
    let mut ups = connect_upstream(&target).await?;
    stream.write_all(&[0x00, 90, 0, 0, 0, 0, 0, 0]).await?;
    tokio::io::copy_bidirectional(&mut stream, &mut ups).await?;
    Ok(())
}

/// Spawn a socks4/socks4a proxy, which rejects all requests if `grant` is false.
pub async fn spawn_socks4_server(grant: bool) -> MockServer {
    let (listener, addr) = bind_local().await;
    let server = MockServer::new(addr);
    let counter = server.connections.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::Relaxed);
            tokio::spawn(socks4_serve(stream, grant));
        }
    });
    server
}

pub struct MockHttpProxy {
    pub addr: SocketAddr,
    pub request_heads: Arc<Mutex<Vec<String>>>,
}

async fn http_proxy_serve(stream: TcpStream, heads: Arc<Mutex<Vec<String>>>) -> io::Result<()> {
    let mut reader = BufReader::new(stream);
    let mut head = String::new();
    loop {
        let n = reader.read_line(&mut head).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        if head.ends_with("\r\n\r\n") {
            break;
        }
    }
    heads.lock().unwrap().push(head.clone());

    let mut parts = head.split_ascii_whitespace();
    let method = parts.next().unwrap_or_default();
    let uri = parts.next().unwrap_or_default();
    if method == "CONNECT" {
        let target: UpstreamAddr = uri.parse().map_err(io::Error::other)?;
        let mut ups = connect_upstream(&target).await?;
        let mut stream = reader.into_inner();
        stream
            .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
            .await?;
        tokio::io::copy_bidirectional(&mut stream, &mut ups).await?;
    } else {
        let uri: http::Uri = uri.parse().map_err(io::Error::other)?;
        let authority = uri
            .authority()
            .ok_or_else(|| io::Error::other("no authority in request uri"))?;
        let target: UpstreamAddr = authority.as_str().parse().map_err(io::Error::other)?;
        let mut ups = connect_upstream(&target).await?;
        ups.write_all(head.as_bytes()).await?;
        ups.write_all(reader.buffer()).await?;
        let mut stream = reader.into_inner();
        tokio::io::copy_bidirectional(&mut stream, &mut ups).await?;
    }
    Ok(())
}

/// Spawn a http forward proxy which records the head of every request.
pub async fn spawn_http_proxy() -> MockHttpProxy {
    let (listener, addr) = bind_local().await;
    let request_heads = Arc::new(Mutex::new(Vec::new()));
    let heads = request_heads.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(http_proxy_serve(stream, heads.clone()));
        }
    });
    MockHttpProxy {
        addr,
        request_heads,
    }
}

/// A cipher which sends the target as a text line, then passes through all data.
pub struct PlainCipher;

#[async_trait]
impl TunnelCipher for PlainCipher {
    fn supports(&self, method: &str) -> bool {
        method == "plain"
    }

    async fn wrap(
        &self,
        mut stream: TcpStream,
        _server: &SsServerDescriptor,
        target: &UpstreamAddr,
    ) -> io::Result<BoxTunnelStream> {
        stream.write_all(format!("{target}\n").as_bytes()).await?;
        Ok(Box::new(stream))
    }
}

async fn read_tunnel_target(reader: &mut BufReader<TcpStream>) -> io::Result<UpstreamAddr> {
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    line.trim_end().parse().map_err(io::Error::other)
}

async fn tunnel_serve(stream: TcpStream) -> io::Result<()> {
    let mut reader = BufReader::new(stream);
    let target = read_tunnel_target(&mut reader).await?;
    let mut ups = connect_upstream(&target).await?;
    ups.write_all(reader.buffer()).await?;
    let mut stream = reader.into_inner();
    tokio::io::copy_bidirectional(&mut stream, &mut ups).await?;
    Ok(())
}

async fn tunnel_bye_serve(stream: TcpStream) -> io::Result<()> {
    let mut reader = BufReader::new(stream);
    let _target = read_tunnel_target(&mut reader).await?;
    let mut stream = reader.into_inner();
    stream.write_all(b"bye").await?;
    stream.shutdown().await?;
    Ok(())
}

async fn spawn_tunnel_with<F, Fut>(serve: F) -> MockServer
where
    F: Fn(TcpStream) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = io::Result<()>> + Send + 'static,
{
    let (listener, addr) = bind_local().await;
    let server = MockServer::new(addr);
    let counter = server.connections.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::Relaxed);
            tokio::spawn(serve(stream));
        }
    });
    server
}

/// Spawn the server side of [`PlainCipher`].
pub async fn spawn_tunnel_server() -> MockServer {
    spawn_tunnel_with(tunnel_serve).await
}

/// Spawn a tunnel server which sends `bye` and closes the connection without reading the client.
pub async fn spawn_bye_tunnel_server() -> MockServer {
    spawn_tunnel_with(tunnel_bye_serve).await
}

fn parse_client_hello_sni(msg: &[u8]) -> Option<String> {
    // handshake type, length, version and random
    let mut offset = 4 + 2 + 32;
    let session_id_len = *msg.get(offset)? as usize;
    offset += 1 + session_id_len;
    let cipher_suites_len = u16::from_be_bytes([*msg.get(offset)?, *msg.get(offset + 1)?]) as usize;
    offset += 2 + cipher_suites_len;
    let compression_len = *msg.get(offset)? as usize;
    offset += 1 + compression_len;
    let extensions_len = u16::from_be_bytes([*msg.get(offset)?, *msg.get(offset + 1)?]) as usize;
    offset += 2;
    let end = offset + extensions_len;

    while offset + 4 <= end {
        let ext_type = u16::from_be_bytes([msg[offset], msg[offset + 1]]);
        let ext_len = u16::from_be_bytes([msg[offset + 2], msg[offset + 3]]) as usize;
        offset += 4;
        if ext_type == 0 {
            // list length, name type, name length
            let name_len =
                u16::from_be_bytes([*msg.get(offset + 3)?, *msg.get(offset + 4)?]) as usize;
            let name = msg.get(offset + 5..offset + 5 + name_len)?;
            return String::from_utf8(name.to_vec()).ok();
        }
        offset += ext_len;
    }
    None
}

/// Spawn a tcp server that reads the first tls ClientHello and reports its SNI.
///
/// The connection is closed right after the ClientHello is received.
pub async fn spawn_sni_capture() -> (SocketAddr, oneshot::Receiver<Option<String>>) {
    let (listener, addr) = bind_local().await;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut hdr = [0u8; 5];
        if stream.read_exact(&mut hdr).await.is_err() || hdr[0] != 0x16 {
            let _ = tx.send(None);
            return;
        }
        let len = u16::from_be_bytes([hdr[3], hdr[4]]) as usize;
        let mut msg = vec![0u8; len];
        if stream.read_exact(&mut msg).await.is_err() {
            let _ = tx.send(None);
            return;
        }
        let _ = tx.send(parse_client_hello_sni(&msg));
    });
    (addr, rx)
}
