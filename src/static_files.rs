//! Static file serving as an ordinary handler.
//!
//! `StaticFiles` maps the request path under a base directory and
//! writes the file into the response, passing non-GET/HEAD requests
//! and unknown paths on to the next handler. Directory-style paths
//! fall back to `index.html`. Traversal segments are rejected before
//! the filesystem is touched.

use std::fs;
use std::path::{Component, Path, PathBuf};

use http::Method;
use tracing::debug;

use crate::http::{Request, Response};
use crate::middleware::{Handler, Next};

pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    /// Resolve a URL path under the base directory, refusing any
    /// parent-directory component.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let clean = url_path.trim_start_matches('/');
        let mut resolved = self.base_dir.clone();
        for component in Path::new(clean).components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if url_path.ends_with('/') || clean.is_empty() {
            resolved.push("index.html");
        }
        Some(resolved)
    }
}

impl Handler for StaticFiles {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        if req.method != Method::GET && req.method != Method::HEAD {
            return next.run(req, res);
        }
        let Some(path) = self.map_path(&req.path) else {
            return next.run(req, res);
        };
        if !path.is_file() {
            return next.run(req, res);
        }
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), size = bytes.len(), "serving static file");
                res.set_status(200);
                res.set_header("Content-Type", mime_type(&path));
                if req.method == Method::GET {
                    res.set_body(bytes);
                }
            }
            Err(_) => {
                res.set_status(403);
            }
        }
    }
}

/// Serve a single file into a response; the counterpart of
/// `Response::send_file`.
pub(crate) fn send_file(file_path: &str, res: &mut Response) {
    let path = Path::new(file_path);
    if !path.is_file() {
        res.set_status(404);
        res.set_body("File not found");
        return;
    }
    match fs::read(path) {
        Ok(bytes) => {
            res.set_status(200);
            res.set_header("Content-Type", mime_type(path));
            res.set_body(bytes);
        }
        Err(_) => {
            res.set_status(403);
            res.set_body("Forbidden");
        }
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
        .as_str()
    {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_path_rejects_traversal() {
        let sf = StaticFiles::new("/srv/www");
        assert!(sf.map_path("/../etc/passwd").is_none());
        assert!(sf.map_path("/a/../../b").is_none());
    }

    #[test]
    fn test_map_path_resolves_under_base() {
        let sf = StaticFiles::new("/srv/www");
        assert_eq!(
            sf.map_path("/css/site.css").unwrap(),
            PathBuf::from("/srv/www/css/site.css")
        );
    }

    #[test]
    fn test_map_path_directory_gets_index() {
        let sf = StaticFiles::new("/srv/www");
        assert_eq!(
            sf.map_path("/docs/").unwrap(),
            PathBuf::from("/srv/www/docs/index.html")
        );
        assert_eq!(
            sf.map_path("/").unwrap(),
            PathBuf::from("/srv/www/index.html")
        );
    }

    #[test]
    fn test_mime_table() {
        assert_eq!(mime_type(Path::new("a.html")), "text/html");
        assert_eq!(mime_type(Path::new("a.svg")), "image/svg+xml");
        assert_eq!(mime_type(Path::new("a.bin")), "application/octet-stream");
        assert_eq!(mime_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_serves_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        let sf = StaticFiles::new(dir.path());

        let mut req = Request {
            method: Method::GET,
            path: "/hello.txt".to_string(),
            ..Request::default()
        };
        let mut res = Response::new();
        sf.handle(&mut req, &mut res, Next::empty());
        assert_eq!(res.status, 200);
        assert_eq!(res.header("Content-Type"), Some("text/plain"));
        assert_eq!(res.body, b"Hello\n");
    }

    #[test]
    fn test_head_sends_headers_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        let sf = StaticFiles::new(dir.path());

        let mut req = Request {
            method: Method::HEAD,
            path: "/hello.txt".to_string(),
            ..Request::default()
        };
        let mut res = Response::new();
        sf.handle(&mut req, &mut res, Next::empty());
        assert_eq!(res.status, 200);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_missing_file_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let sf = StaticFiles::new(dir.path());

        let mut req = Request {
            method: Method::GET,
            path: "/nope.txt".to_string(),
            ..Request::default()
        };
        let mut res = Response::new();
        let fell_through = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = fell_through.clone();
        let next = Next::new(move |_req: &mut Request, _res: &mut Response| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });
        sf.handle(&mut req, &mut res, next);
        assert!(fell_through.load(std::sync::atomic::Ordering::SeqCst));
    }
}
