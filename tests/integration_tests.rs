// End-to-end tests over loopback TCP: routers exchanging distance vectors,
// failure announcements and the transport retry behavior.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::TcpListener;

use dive_router::client::ProtocolClient;
use dive_router::core::Router;
use dive_router::protocol::{decode, read_frame, ControlMessage, WireMessage};
use dive_router::read_config::Topology;
use dive_router::server::ProtocolServer;
use dive_router::utils::{Logger, RetryPolicy, RouterSettings};
use dive_router::INFINITY;

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn line_topology(ports: [u16; 3], pof: f64) -> Topology {
    Topology::from_json(&format!(
        r#"{{
            "nodes": {{
                "R1": {{ "ip_address": "127.0.0.1", "port": {} }},
                "R2": {{ "ip_address": "127.0.0.1", "port": {} }},
                "R3": {{ "ip_address": "127.0.0.1", "port": {} }}
            }},
            "links": [
                {{ "source": "R1", "target": "R2", "pof": {} }},
                {{ "source": "R2", "target": "R3" }}
            ]
        }}"#,
        ports[0], ports[1], ports[2], pof
    ))
    .unwrap()
}

fn router(topology: &Topology, router_id: &str, interval_secs: u64) -> Router {
    let settings = RouterSettings {
        interval_secs,
        outage_delay_secs: 3600,
        retry: RetryPolicy {
            initial_backoff_ms: 10,
            max_backoff_ms: 100,
            max_attempts: None,
        },
    };
    Router::new(
        topology.identity_of(router_id).unwrap(),
        settings,
        topology,
        Logger::new(router_id),
    )
}

#[tokio::test]
async fn test_send_to_waits_for_delayed_listener() {
    let port = free_port().await;

    let listener_task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let (mut sock, _) = listener.accept().await.unwrap();
        read_frame(&mut sock).await.unwrap()
    });

    let client = ProtocolClient::new(
        RetryPolicy { initial_backoff_ms: 10, max_backoff_ms: 50, max_attempts: None },
        Logger::new("test").child("client"),
    );
    let payload = dive_router::protocol::encode(&WireMessage::ControlMessage(ControlMessage::down("R1"))).unwrap();
    let sent = client.send_to("127.0.0.1", port, &payload).await.unwrap();

    assert_eq!(sent, payload.len() + 4);
    let received = listener_task.await.unwrap();
    assert_eq!(
        decode(&received).unwrap(),
        WireMessage::ControlMessage(ControlMessage::down("R1"))
    );
}

#[tokio::test]
async fn test_broadcast_reaches_only_live_neighbors() {
    let ports = [free_port().await, free_port().await, free_port().await];
    let topology = line_topology(ports, 0.0);
    let r2 = router(&topology, "R2", 1);

    let r1_server = ProtocolServer::bind("127.0.0.1", ports[0], Logger::new("R1")).await.unwrap();
    let r1_receiver = tokio::spawn(async move { r1_server.receive().await });

    // R3's link is down, so only R1 gets the vector
    r2.state().mark_link_down("R3").await;
    assert_eq!(r2.broadcast_once().await, 1);

    match r1_receiver.await.unwrap() {
        WireMessage::DistanceVectorUpdate(update) => {
            assert_eq!(update.origin_id, "R2");
            let entries: Vec<_> = update
                .entries
                .iter()
                .map(|e| (e.node_id.as_str(), e.distance))
                .collect();
            assert_eq!(entries, vec![("R1", 1), ("R2", 0), ("R3", INFINITY)]);
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[tokio::test]
async fn test_three_routers_converge() {
    let ports = [free_port().await, free_port().await, free_port().await];
    let topology = line_topology(ports, 0.0);

    let routers: Vec<Arc<Router>> = ["R1", "R2", "R3"]
        .iter()
        .map(|id| Arc::new(router(&topology, id, 1)))
        .collect();
    let handles: Vec<_> = routers
        .iter()
        .map(|r| tokio::spawn(Arc::clone(r).run()))
        .collect();

    let r1 = Arc::clone(&routers[0]);
    let r3 = Arc::clone(&routers[2]);
    let converged = tokio::time::timeout(Duration::from_secs(15), async {
        loop {
            if r1.state().cost("R3").await == Some(2) && r3.state().cost("R1").await == Some(2) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;

    for handle in handles {
        handle.abort();
    }
    assert!(converged.is_ok(), "routers did not converge");
    assert_eq!(r1.state().link("R3").await.unwrap().next_hop, "R2");
    assert_eq!(r3.state().link("R1").await.unwrap().next_hop, "R2");
    assert_eq!(routers[1].state().cost("R1").await, Some(1));
    assert_eq!(routers[1].state().cost("R3").await, Some(1));
}

#[tokio::test]
async fn test_outage_is_announced_to_neighbor() {
    let ports = [free_port().await, free_port().await, free_port().await];
    let topology = line_topology(ports, 1.0);
    let r1 = router(&topology, "R1", 5);
    let r2 = Arc::new(router(&topology, "R2", 5));

    let server = r2.bind().await.unwrap();
    let receiver = {
        let r2 = Arc::clone(&r2);
        tokio::spawn(async move { r2.receive_one(&server).await })
    };

    let mut rng = StdRng::seed_from_u64(42);
    let failed = r1.outage_simulator().inject(&mut rng).await;
    assert_eq!(failed, vec!["R2".to_string()]);
    assert_eq!(r1.state().cost("R2").await, Some(INFINITY));
    assert!(!r1.state().link("R2").await.unwrap().up);

    receiver.await.unwrap();
    assert_eq!(r2.state().cost("R1").await, Some(INFINITY));
    assert!(!r2.state().link("R1").await.unwrap().up);
    // R2's other link is untouched
    assert_eq!(r2.state().cost("R3").await, Some(1));
}

#[tokio::test]
async fn test_zero_probability_never_fails() {
    let ports = [free_port().await, free_port().await, free_port().await];
    let topology = line_topology(ports, 0.0);
    let r1 = router(&topology, "R1", 5);

    let mut rng = StdRng::seed_from_u64(1);
    assert!(r1.outage_simulator().inject(&mut rng).await.is_empty());
    assert!(r1.state().link("R2").await.unwrap().up);
}
