use axum::Router;
use platform_api::{ApiClient, ClientConfig};

/// Serve `router` on an ephemeral local port and return a client for it.
pub async fn spawn_backend(router: Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    ApiClient::new(ClientConfig::new(&format!("http://{addr}")).unwrap()).unwrap()
}
