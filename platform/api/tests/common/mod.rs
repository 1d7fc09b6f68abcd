use axum::Router;
use platform_api::{ApiClient, ClientConfig};

pub const TOKEN: &str = "test-token";

/// Serve `router` on an ephemeral local port and return a client for it.
pub async fn spawn_backend(router: Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let config = ClientConfig::new(&format!("http://{addr}"))
        .unwrap()
        .with_token(Some(TOKEN.to_string()));
    ApiClient::new(config).unwrap()
}

/// A client pointed at a port nothing listens on.
pub async fn unreachable_client() -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ApiClient::new(ClientConfig::new(&format!("http://{addr}")).unwrap()).unwrap()
}
