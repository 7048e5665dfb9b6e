use crate::http::make_boxed_error_response;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

/// Serves the admin listener.
///
/// - `/health`: always `ok` while the process runs
/// - `/ready`: `ok` once `is_ready` returns true, 503 before
/// - `/version`: `<name> <version>` of the running binary
pub struct AdminService<F> {
    is_ready: F,
    version: Bytes,
}

impl<F> AdminService<F>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F, name: &str, version: &str) -> Self {
        Self {
            is_ready,
            version: Bytes::from(format!("{name} {version}\n")),
        }
    }
}

impl<F> Service<Request<Incoming>> for AdminService<F>
where
    F: Fn() -> bool,
{
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let text = |body: Bytes| Response::new(Full::new(body).boxed());

        let res = match req.uri().path() {
            "/health" => text(Bytes::from_static(b"ok\n")),
            "/ready" if (self.is_ready)() => text(Bytes::from_static(b"ok\n")),
            "/ready" => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
            "/version" => text(self.version.clone()),
            _ => make_boxed_error_response(StatusCode::NOT_FOUND),
        };

        Box::pin(async move { Ok(res) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::run_http_service;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr").port()
    }

    #[tokio::test]
    async fn test_admin_endpoints() {
        let ready = Arc::new(AtomicBool::new(false));
        let ready_flag = ready.clone();
        let service =
            AdminService::new(move || ready_flag.load(Ordering::Relaxed), "lets", "1.2.3");

        let port = free_port();
        tokio::spawn(async move { run_http_service("127.0.0.1", port, service).await });
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let base = format!("http://127.0.0.1:{port}");
        let client = reqwest::Client::new();

        let res = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "ok\n");

        let res = client.get(format!("{base}/ready")).send().await.unwrap();
        assert_eq!(res.status(), 503);

        ready.store(true, Ordering::Relaxed);
        let res = client.get(format!("{base}/ready")).send().await.unwrap();
        assert_eq!(res.status(), 200);

        let res = client.get(format!("{base}/version")).send().await.unwrap();
        assert_eq!(res.text().await.unwrap(), "lets 1.2.3\n");

        let res = client.get(format!("{base}/nope")).send().await.unwrap();
        assert_eq!(res.status(), 404);
    }
}
