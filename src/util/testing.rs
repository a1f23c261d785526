//! Local HTTP servers standing in for upstream sites in tests.

use axum::Router;
use tokio::net::TcpListener;

/// 在 127.0.0.1 的隨機 port 上啟動 router，回傳 base url
pub(crate) async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    format!("http://{}", addr)
}

/// 一個沒有人在聽的位址，連線一定會被拒絕
pub(crate) async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener addr");
    drop(listener);

    format!("http://{}", addr)
}
