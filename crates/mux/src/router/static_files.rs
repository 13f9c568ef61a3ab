//! Serving files from a directory under a URL prefix.
//!
//! [`Router::static_files`] registers `GET` and `HEAD` on `<prefix>/:filepath`. The
//! catch-all binds the rest of the request path, which is resolved below the
//! directory. Anything but plain file names is rejected: `..`, absolute paths and
//! directories answer `404 Not Found`, so directories are never listed.

use super::{Router, Routes};
use crate::body::ResponseBody;
use crate::handler::RequestHandler;
use crate::request::RequestContext;
use crate::responder::Responder;
use crate::trie::segment::CATCH_ALL_PARAM;
use async_trait::async_trait;
use futures::TryStreamExt;
use http::{HeaderValue, Method, Response, StatusCode};
use http_body::Frame;
use http_body_util::StreamBody;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

/// Writes the bytes of a resolved file into a response.
#[async_trait]
pub trait FileServer: Send + Sync {
    /// `path` is known to exist and not to be a directory.
    async fn serve(&self, req: &RequestContext, path: &Path) -> Response<ResponseBody>;
}

/// Streams files from disk, setting `Content-Type` from the file extension and `Content-Length`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingFileServer;

#[async_trait]
impl FileServer for StreamingFileServer {
    async fn serve(&self, req: &RequestContext, path: &Path) -> Response<ResponseBody> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) => return io_error_response(&e, path),
        };

        let len = match file.metadata().await {
            Ok(metadata) => metadata.len(),
            Err(e) => return io_error_response(&e, path),
        };

        let body = if req.method() == Method::HEAD {
            ResponseBody::empty()
        } else {
            ResponseBody::stream(StreamBody::new(ReaderStream::new(file).map_ok(Frame::data)))
        };

        let mut response = Response::new(body);
        let headers = response.headers_mut();
        if let Ok(content_type) = HeaderValue::from_str(content_type(path).as_ref()) {
            headers.insert(http::header::CONTENT_TYPE, content_type);
        }
        headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from(len));
        response
    }
}

fn content_type(path: &Path) -> mime::Mime {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js" | "mjs") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("csv") => mime::TEXT_CSV_UTF_8,
        Some("xml") => mime::TEXT_XML,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("bmp") => mime::IMAGE_BMP,
        Some("pdf") => mime::APPLICATION_PDF,
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn io_error_response(e: &io::Error, path: &Path) -> Response<ResponseBody> {
    let status = match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => StatusCode::NOT_FOUND,
        io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        _ => {
            error!(cause = %e, path = %path.display(), "failed to open static file");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    status_response(status)
}

fn status_response(status: StatusCode) -> Response<ResponseBody> {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

struct StaticHandler {
    root: PathBuf,
    server: Arc<dyn FileServer>,
}

impl StaticHandler {
    /// The file path relative to the root, if it only has plain file name components.
    fn relative_path(req: &RequestContext) -> Option<PathBuf> {
        let captured = req.param(CATCH_ALL_PARAM).trim_start_matches('/');
        if captured.is_empty() {
            return None;
        }

        let relative = Path::new(captured);
        relative.components().all(|component| matches!(component, Component::Normal(_))).then(|| relative.to_path_buf())
    }
}

#[async_trait]
impl RequestHandler for StaticHandler {
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody> {
        let Some(relative) = Self::relative_path(&req) else {
            debug!(path = req.path(), "rejected static file path");
            return status_response(StatusCode::NOT_FOUND);
        };

        let path = self.root.join(relative);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => {
                warn!(path = %path.display(), "directory listing is not allowed");
                status_response(StatusCode::NOT_FOUND)
            }
            Ok(_) => self.server.serve(&req, &path).await,
            Err(e) => io_error_response(&e, &path),
        }
    }
}

impl fmt::Debug for StaticHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticHandler").field("root", &self.root).finish_non_exhaustive()
    }
}

impl Router {
    /// Serves the files below `dir` under the URL `prefix`.
    ///
    /// # Panics
    /// Panics if `GET` or `HEAD` already has a route at `<prefix>/:filepath`.
    pub fn static_files(&mut self, prefix: &str, dir: impl Into<PathBuf>) -> Routes<'_> {
        self.static_files_with(prefix, dir, StreamingFileServer)
    }

    /// Like [`static_files`](Self::static_files), delegating the byte serving to `server`.
    ///
    /// # Panics
    /// Panics if `GET` or `HEAD` already has a route at `<prefix>/:filepath`.
    pub fn static_files_with<S>(&mut self, prefix: &str, dir: impl Into<PathBuf>, server: S) -> Routes<'_>
    where
        S: FileServer + 'static,
    {
        let root = dir.into();
        debug!(prefix, root = %root.display(), "serving static files");

        let pattern = format!("{prefix}/:{CATCH_ALL_PARAM}");
        let handler = StaticHandler { root, server: Arc::new(server) };
        self.handle(&pattern, handler, &[Method::GET.as_str(), Method::HEAD.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::{FileServer, content_type};
    use crate::body::ResponseBody;
    use crate::request::RequestContext;
    use crate::router::Router;
    use crate::router::tests::send;
    use async_trait::async_trait;
    use http::{Method, Response, StatusCode};
    use std::path::Path;

    fn assets() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello static").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css").join("site.css"), "body {}").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_serve_file() {
        let dir = assets();
        let mut router = Router::new();
        router.static_files("/static/", dir.path());

        assert_eq!(router.routes(), vec![("GET", "/static/:filepath"), ("HEAD", "/static/:filepath")]);

        let (status, headers, body) = send(&router, Method::GET, "/static/a.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello static");
        assert_eq!(headers[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(headers[http::header::CONTENT_LENGTH], "12");

        let (status, headers, body) = send(&router, Method::GET, "/static/css/site.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body {}");
        assert_eq!(headers[http::header::CONTENT_TYPE], "text/css; charset=utf-8");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = assets();
        let mut router = Router::new();
        router.static_files("/static", dir.path());

        let (status, headers, body) = send(&router, Method::HEAD, "/static/a.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[http::header::CONTENT_LENGTH], "12");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_paths() {
        let dir = assets();
        let mut router = Router::new();
        router.static_files("/static", dir.path());

        for path in ["/static/css", "/static/", "/static/missing.txt", "/static/../a.txt", "/static/css/../a.txt"] {
            let (status, _, _) = send(&router, Method::GET, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn test_custom_file_server() {
        struct NameServer;

        #[async_trait]
        impl FileServer for NameServer {
            async fn serve(&self, _req: &RequestContext, path: &Path) -> Response<ResponseBody> {
                let name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default().to_owned();
                Response::new(ResponseBody::from(name))
            }
        }

        let dir = assets();
        let mut router = Router::new();
        router.static_files_with("/files", dir.path(), NameServer);

        let (status, _, body) = send(&router, Method::GET, "/files/css/site.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "site.css");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("index.HTML")), mime::TEXT_HTML_UTF_8);
        assert_eq!(content_type(Path::new("logo.png")), mime::IMAGE_PNG);
        assert_eq!(content_type(Path::new("archive")), mime::APPLICATION_OCTET_STREAM);
    }
}
