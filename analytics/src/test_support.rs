//! A canned-response HTTP server standing in for the YouTube API and Google's token endpoint.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// One canned route: request path, response status, JSON response body.
pub(crate) type Route = (&'static str, u16, serde_json::Value);

/// Serves [`Route`]s on a random localhost port until dropped, recording every request.
///
/// Unknown paths get a 404 with an empty JSON object.
pub(crate) struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    server: JoinHandle<()>,
}

impl StubServer {
    pub(crate) async fn start(routes: Vec<Route>) -> Self {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let server = tokio::spawn(async move {
            while let Ok((conn, _)) = socket.accept().await {
                let routes = Arc::clone(&routes);
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let routes = Arc::clone(&routes);
                        let recorded = Arc::clone(&recorded);
                        async move {
                            let path = req.uri().path().to_string();
                            let line = match req.uri().query() {
                                Some(query) => format!("{} {path}?{query}", req.method()),
                                None => format!("{} {path}", req.method()),
                            };
                            recorded.lock().unwrap().push(line);

                            let (status, body) = routes
                                .iter()
                                .find(|(p, _, _)| *p == path)
                                .map(|(_, status, body)| (*status, body.to_string()))
                                .unwrap_or((404, "{}".to_string()));
                            let response = Response::builder()
                                .status(status)
                                .header("Content-Type", "application/json")
                                .body(Full::<Bytes>::from(body))
                                .unwrap();
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let conn = hyper_util::rt::TokioIo::new(conn);
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(conn, service)
                        .await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            server,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Every request seen so far, as `"METHOD /path?query"`.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}
