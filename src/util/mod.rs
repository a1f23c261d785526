use std::sync::Once;

pub mod http;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

/// reqwest 使用 rustls-no-provider，建立 client 之前必須先安裝 crypto provider
pub fn ensure_rustls_crypto_provider() {
    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| {
        // 已經有別人安裝過的話會回傳 Err，忽略即可
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
