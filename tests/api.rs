use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
};

use hcloud_discover::{
    hcloud::{
        api::{FloatingAddress, HcloudClient, Inventory, IpFamily, PublicAddress},
        discovery::Discovery,
    },
    AddressFamily, DiscoverError, NoopLogger, ResolvedConfig,
};
use serde_json::{json, Value};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

type Route = fn(&str) -> (u16, Value);

/// A minimal HTTP/1.1 server answering each request with `route(target)`.
/// Returns its address and the request heads it received, in order.
async fn serve(route: Route) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };

            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let head = String::from_utf8_lossy(&head).to_string();
            let target = head
                .lines()
                .next()
                .and_then(|line| line.split(' ').nth(1))
                .unwrap_or_default()
                .to_string();
            seen.lock().unwrap().push(head);

            let (status, body) = route(&target);
            let body = body.to_string();
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    (addr, requests)
}

fn request_lines(requests: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    requests
        .lock()
        .unwrap()
        .iter()
        .map(|head| head.lines().next().unwrap_or_default().to_string())
        .collect()
}

fn config(addr: SocketAddr) -> ResolvedConfig {
    ResolvedConfig {
        api_token: "secret".to_string(),
        location: None,
        label_selector: "role=consul".to_string(),
        address_family: AddressFamily::PublicV4,
        // trailing slash must not end up in request paths
        endpoint: format!("http://{}/v1/", addr),
    }
}

fn server(id: u64, name: &str, location: &str, public_v4: &str, blocked: bool, floating: &[u64]) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": "running",
        "datacenter": { "name": format!("{}-dc1", location), "location": { "name": location } },
        "public_net": {
            "ipv4": { "ip": public_v4, "blocked": blocked },
            "ipv6": { "ip": "2001:db8::/64", "blocked": false },
            "floating_ips": floating
        },
        "private_net": [{ "network": 1, "ip": format!("10.0.0.{}", id), "alias_ips": [] }]
    })
}

fn page(servers: Vec<Value>, next_page: Option<u64>) -> Value {
    json!({
        "servers": servers,
        "meta": { "pagination": { "per_page": 50, "next_page": next_page } }
    })
}

fn paged_inventory(target: &str) -> (u16, Value) {
    if target.starts_with("/v1/servers?") && target.contains("page=1&") {
        (
            200,
            page(vec![server(1, "consul-1", "fsn1", "1.1.1.1", false, &[])], Some(2)),
        )
    } else if target.starts_with("/v1/servers?") && target.contains("page=2&") {
        (
            200,
            page(
                vec![server(2, "consul-2", "nbg1", "2.2.2.2", true, &[9, 7, 8])],
                None,
            ),
        )
    } else if target.starts_with("/v1/floating_ips?") {
        (
            200,
            json!({
                "floating_ips": [
                    { "id": 8, "ip": "2001:db8:1::/64", "type": "ipv6", "blocked": false, "server": 2 },
                    { "id": 7, "ip": "5.6.7.8", "type": "ipv4", "blocked": false, "server": 2 }
                ],
                "meta": { "pagination": { "per_page": 50, "next_page": null } }
            }),
        )
    } else {
        (404, json!({ "error": { "code": "not_found", "message": "not found" } }))
    }
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[tokio::test]
async fn running_servers_follow_pages_and_resolve_floating_ips() {
    let (addr, requests) = serve(paged_inventory).await;
    let client = HcloudClient::new(&config(addr));

    let records = client.running_servers("role=consul").await.unwrap();

    assert_eq!(
        request_lines(&requests),
        vec![
            "GET /v1/servers?status=running&label_selector=role%3Dconsul&page=1&per_page=50 HTTP/1.1",
            "GET /v1/servers?status=running&label_selector=role%3Dconsul&page=2&per_page=50 HTTP/1.1",
            "GET /v1/floating_ips?page=1&per_page=50 HTTP/1.1",
        ]
    );
    assert!(requests
        .lock()
        .unwrap()
        .iter()
        .all(|head| head.to_lowercase().contains("authorization: bearer secret")));

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "consul-1");
    assert!(records[0].endpoints.floating.is_empty());

    let second = &records[1];
    assert_eq!(second.location, "nbg1");
    assert_eq!(second.endpoints.private, vec![ip("10.0.0.2")]);
    assert_eq!(
        second.endpoints.public_v4,
        Some(PublicAddress {
            ip: ip("2.2.2.2"),
            blocked: true,
        })
    );
    // id 9 is unknown to the floating IP listing; the rest keep the server's order
    assert_eq!(
        second.endpoints.floating,
        vec![
            FloatingAddress {
                ip: ip("5.6.7.8"),
                family: IpFamily::V4,
                blocked: false,
            },
            FloatingAddress {
                ip: ip("2001:db8:1::"),
                family: IpFamily::V6,
                blocked: false,
            },
        ]
    );
}

#[tokio::test]
async fn empty_label_selector_and_no_floating_ips_skip_extra_requests() {
    fn route(_target: &str) -> (u16, Value) {
        (
            200,
            page(vec![server(1, "consul-1", "fsn1", "1.1.1.1", false, &[])], None),
        )
    }
    let (addr, requests) = serve(route).await;
    let client = HcloudClient::new(&config(addr));

    let records = client.running_servers("").await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(
        request_lines(&requests),
        vec!["GET /v1/servers?status=running&page=1&per_page=50 HTTP/1.1"]
    );
}

#[tokio::test]
async fn error_response_carries_api_message() {
    fn route(_target: &str) -> (u16, Value) {
        (
            401,
            json!({ "error": { "code": "unauthorized", "message": "unable to authenticate" } }),
        )
    }
    let (addr, _) = serve(route).await;
    let client = HcloudClient::new(&config(addr));

    let res = client.running_servers("role=consul").await;
    assert_eq!(
        res.unwrap_err(),
        DiscoverError::ProviderRequestFailed(
            "/servers returned 401 Unauthorized: unable to authenticate (unauthorized)".to_string()
        )
    );
}

#[tokio::test]
async fn server_by_name_queries_exact_name() {
    fn route(target: &str) -> (u16, Value) {
        if target == "/v1/servers?name=consul-2" {
            (
                200,
                page(vec![server(2, "consul-2", "nbg1", "2.2.2.2", false, &[7])], None),
            )
        } else {
            (200, page(vec![], None))
        }
    }
    let (addr, requests) = serve(route).await;
    let client = HcloudClient::new(&config(addr));

    let found = client.server_by_name("consul-2").await.unwrap().unwrap();
    assert_eq!(found.id, 2);
    assert_eq!(found.location, "nbg1");
    assert!(found.endpoints.floating.is_empty());

    assert_eq!(client.server_by_name("laptop").await.unwrap(), None);
    assert_eq!(
        request_lines(&requests),
        vec![
            "GET /v1/servers?name=consul-2 HTTP/1.1",
            "GET /v1/servers?name=laptop HTTP/1.1",
        ]
    );
}

#[tokio::test]
async fn discovery_over_http_uses_floating_fallback() {
    let (addr, _) = serve(paged_inventory).await;
    let config = ResolvedConfig {
        location: Some("nbg1".to_string()),
        ..config(addr)
    };

    let addrs = Discovery::new(HcloudClient::new(&config), &NoopLogger)
        .run(&config)
        .await
        .unwrap();

    assert_eq!(addrs, vec!["5.6.7.8"]);
}
