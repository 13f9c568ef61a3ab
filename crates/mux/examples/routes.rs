use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use micro_mux::middleware::{Next, from_fn};
use micro_mux::{RequestContext, Router, handler_fn};
use std::time::Instant;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

async fn hello_world(_req: RequestContext) -> &'static str {
    "hello world"
}

async fn get_user(req: RequestContext) -> String {
    format!("user {}", req.param("id"))
}

async fn login(req: RequestContext) -> (StatusCode, String) {
    (StatusCode::CREATED, format!("login with {} bytes", req.body().len()))
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut router = Router::builder().handle_method_not_allowed(true).handle_options(true).build();

    router.with(from_fn(|req: RequestContext, next: Next| async move {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let response = next.run(req).await;
        info!(%method, path = %path, status = %response.status(), elapsed = ?start.elapsed(), "request served");
        response
    }));

    router.get("/", handler_fn(hello_world));
    router.get("/users/:id|^[0-9]+$", handler_fn(get_user));

    let mut auth = router.group("/v1/auth");
    auth.post("/login", handler_fn(login));

    router.static_files("/static", env!("CARGO_MANIFEST_DIR"));

    router.print_routes();
    for overlap in router.validate() {
        error!(
            method = %overlap.method,
            first = %overlap.first,
            second = %overlap.second,
            kind = ?overlap.kind,
            "ambiguous routes"
        );
    }

    let requests = [
        (Method::GET, "/"),
        (Method::GET, "/users/42"),
        (Method::GET, "/users/bob"),
        (Method::POST, "/v1/auth/login"),
        (Method::DELETE, "/v1/auth/login"),
        (Method::OPTIONS, "/users/42"),
        (Method::GET, "/static/Cargo.toml"),
        (Method::GET, "/static/src"),
    ];

    for (method, path) in requests {
        let request = Request::builder().method(method).uri(path).body(Bytes::new()).expect("valid request");
        let response = router.call(request).await;
        let status = response.status();
        let allow = response.headers().get(http::header::ALLOW).cloned();
        let body = match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                error!(cause = %e, "read body error");
                continue;
            }
        };
        info!(path, %status, ?allow, body_len = body.len(), "response");
    }
}
