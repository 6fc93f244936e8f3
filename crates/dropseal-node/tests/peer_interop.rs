//! `PeerServer` and `HttpResolver` over a real loopback socket.

use std::{sync::Arc, time::Duration};

use dropseal_core::{
    MetadataResolver, MetadataSource, NetworkError, NoNetwork, ShareCode, ShareConfig,
    ShareError, ShareManager,
};
use dropseal_crypto::{SealedPayload, SecretKey, open};
use dropseal_harness::{MemoryFs, RecordingSink, ScriptedOperator, SimEnv};
use dropseal_node::{HttpResolver, PeerServer, PeerServerConfig};
use dropseal_store::MemoryStorage;
use tokio::sync::oneshot;

type Shares = ShareManager<MemoryStorage, SimEnv, NoNetwork>;

struct Sender {
    shares: Arc<Shares>,
    env: SimEnv,
    peer: String,
    stop: Option<oneshot::Sender<()>>,
}

impl Sender {
    async fn start() -> Self {
        let env = SimEnv::with_seed(21);
        let shares = Arc::new(ShareManager::new(
            MemoryStorage::new(),
            env.clone(),
            NoNetwork,
            ShareConfig::default(),
        ));

        let config = PeerServerConfig { bind_address: "127.0.0.1:0".to_string() };
        let server = PeerServer::bind(&config, Arc::clone(&shares)).await.unwrap();
        let peer = server.local_addr().unwrap().to_string();

        let (stop, stopped) = oneshot::channel();
        tokio::spawn(server.run_until(async {
            let _ = stopped.await;
        }));

        Self { shares, env, peer, stop: Some(stop) }
    }

    fn publish(&self, plaintext: &[u8], key: &SecretKey) -> ShareCode {
        let fs = MemoryFs::with_file("/send/report.pdf", plaintext);
        let created = self
            .shares
            .create_share(Some(std::path::Path::new("/send/report.pdf")), key, &fs)
            .unwrap();
        self.shares
            .publish_share(
                &created.encrypted,
                &created.code,
                &created.original_file_name,
                &RecordingSink::new(),
            )
            .unwrap();
        created.code
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

fn resolver() -> HttpResolver {
    HttpResolver::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetch_returns_share_once() {
    let sender = Sender::start().await;
    let key = SecretKey::from_bytes([3; 32]);
    let code = sender.publish(b"quarterly numbers", &key);

    let remote = resolver().fetch(&sender.peer, &code).await.unwrap();
    assert_eq!(remote.original_filename, "report.pdf");
    let payload = SealedPayload::from_base64(&remote.encrypted).unwrap();
    assert_eq!(open(&payload, &key).unwrap(), b"quarterly numbers");

    // Served shares are consumed on the sender
    assert_eq!(sender.shares.share_status(&code).unwrap(), None);
    assert_eq!(resolver().fetch(&sender.peer, &code).await, Err(NetworkError::Status(404)));
}

#[tokio::test]
async fn status_codes() {
    let sender = Sender::start().await;
    let key = SecretKey::from_bytes([3; 32]);
    let client = reqwest::Client::new();
    let base = format!("http://{}", sender.peer);

    let malformed = client.get(format!("{base}/share/not-a-code")).send().await.unwrap();
    assert_eq!(malformed.status().as_u16(), 400);

    let unknown = ShareCode::generate(&SimEnv::with_seed(1234));
    assert_eq!(resolver().fetch(&sender.peer, &unknown).await, Err(NetworkError::Status(404)));

    let reserved = sender.publish(b"busy", &key);
    sender.shares.resolve(&reserved, None).await.unwrap();
    assert_eq!(resolver().fetch(&sender.peer, &reserved).await, Err(NetworkError::Status(409)));

    let stale = sender.publish(b"old", &key);
    sender.env.advance(ShareConfig::default().share_ttl + Duration::from_secs(1));
    assert_eq!(resolver().fetch(&sender.peer, &stale).await, Err(NetworkError::Status(410)));
    assert_eq!(sender.shares.share_status(&stale).unwrap(), None);
}

#[tokio::test]
async fn uppercase_code_in_url_is_accepted() {
    let sender = Sender::start().await;
    let code = sender.publish(b"x", &SecretKey::from_bytes([3; 32]));

    let url = format!("http://{}/share/{}", sender.peer, code.to_string().to_uppercase());
    let response = reqwest::get(url).await.unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn receiver_redeems_over_the_network() {
    let sender = Sender::start().await;
    let key = SecretKey::from_bytes([3; 32]);
    let code = sender.publish(b"over loopback", &key);

    // Receiver has its own, empty store
    let receiver_store = MemoryStorage::new();
    let receiver = ShareManager::new(
        receiver_store.clone(),
        SimEnv::with_seed(99),
        resolver(),
        ShareConfig::default(),
    );
    let fs = MemoryFs::new();
    let operator = ScriptedOperator::saving_to("/recv/report.pdf").with_peer(sender.peer.clone());

    let outcome = receiver.redeem_share(&code.to_string(), &key, &operator, &fs).await.unwrap();

    assert_eq!(outcome.source, MetadataSource::Network);
    assert_eq!(fs.contents("/recv/report.pdf"), Some(b"over loopback".to_vec()));
    assert!(receiver_store.is_empty());

    // The sender served it once; the receiver has no local copy
    let operator = ScriptedOperator::saving_to("/recv/2").with_peer(sender.peer.clone());
    let again = receiver.redeem_share(&code.to_string(), &key, &operator, &fs).await;
    assert_eq!(again, Err(ShareError::MetadataNotFound));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let peer = listener.local_addr().unwrap().to_string();
    drop(listener);

    let code = ShareCode::generate(&SimEnv::new());
    let result = resolver().fetch(&peer, &code).await;
    assert!(matches!(result, Err(NetworkError::Unreachable(_))), "{result:?}");
}

#[tokio::test]
async fn non_share_body_is_malformed() {
    // Any HTTP server that answers 200 with the wrong JSON
    let app = axum::Router::new().route(
        "/share/{code}",
        axum::routing::get(|| async { axum::Json(serde_json::json!({ "hello": "world" })) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let peer = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move { axum::serve(listener, app).await });

    let code = ShareCode::generate(&SimEnv::new());
    let result = resolver().fetch(&peer, &code).await;
    assert!(matches!(result, Err(NetworkError::Malformed(_))), "{result:?}");
}

#[tokio::test]
async fn invalid_peer_address_never_connects() {
    let code = ShareCode::generate(&SimEnv::new());
    let result = resolver().fetch("not a host", &code).await;
    assert!(matches!(result, Err(NetworkError::InvalidAddress(_))));
}
