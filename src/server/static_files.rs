//! Static asset serving.
//!
//! Request paths are mapped onto a root directory. Every path is
//! percent-decoded and checked segment by segment, then canonicalized and
//! required to stay under the canonicalized root, so neither `..` nor a
//! symlink pointing outside the root can reach other files.
//!
//! Directories follow the usual file-server rules: `/dir` redirects to
//! `/dir/`, which serves the index file when there is one and otherwise a
//! listing (or 404 when listings are disabled).
//!
//! Once a request has resolved to a file, [`ServeFile`] answers it, which
//! brings `Range`, `Last-Modified` and conditional requests.

use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use casecraft_common::{Error, Result};
use mime_guess::mime::{self, Mime};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::config::ServerConfig;

/// Characters escaped in listing hrefs.
const HREF_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// What a request path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A regular file under the root (canonical path).
    File(PathBuf),
    /// A directory requested without its trailing slash.
    Redirect(String),
    /// A directory without an index file.
    Listing(PathBuf),
}

/// A root directory and the policy for serving it.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
    directory_listing: bool,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_file: "index.html".to_string(),
            directory_listing: true,
        }
    }

    pub fn with_index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = name.into();
        self
    }

    pub fn with_directory_listing(mut self, enabled: bool) -> Self {
        self.directory_listing = enabled;
        self
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.static_dir)
            .with_index_file(&config.index_file)
            .with_directory_listing(config.directory_listing)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path (as it appears in the URI, still percent-encoded)
    /// onto the filesystem.
    pub async fn resolve(&self, request_path: &str) -> Result<Resolved> {
        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| Error::invalid_input("request path is not valid UTF-8"))?;

        let segments = checked_segments(&decoded)?;

        // A root that does not exist simply has nothing to serve.
        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|_| Error::not_found(format!("static root {:?}", self.root)))?;

        let mut candidate = root.clone();
        candidate.extend(&segments);

        let target = self.contained(&root, &candidate).await?;
        let metadata = tokio::fs::metadata(&target)
            .await
            .map_err(|_| Error::not_found(decoded.to_string()))?;

        if metadata.is_file() {
            return Ok(Resolved::File(target));
        }
        if !metadata.is_dir() {
            return Err(Error::not_found(decoded.to_string()));
        }

        if !request_path.ends_with('/') {
            return Ok(Resolved::Redirect(directory_location(&segments)));
        }

        let index = target.join(&self.index_file);
        if let Ok(index) = self.contained(&root, &index).await {
            if tokio::fs::metadata(&index)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
            {
                return Ok(Resolved::File(index));
            }
        }

        if self.directory_listing {
            Ok(Resolved::Listing(target))
        } else {
            Err(Error::not_found(decoded.to_string()))
        }
    }

    /// Canonicalize `path` and require it to lie under `root`.
    async fn contained(&self, root: &Path, path: &Path) -> Result<PathBuf> {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| Error::not_found(path.display().to_string()))?;

        if !canonical.starts_with(root) {
            tracing::warn!(path = %path.display(), "Request resolved outside static root");
            return Err(Error::invalid_input("path escapes static root"));
        }
        Ok(canonical)
    }

    /// Resolve the request and build its response.
    pub async fn serve(&self, req: Request) -> Result<Response> {
        let request_path = req.uri().path().to_owned();
        match self.resolve(&request_path).await? {
            Resolved::File(path) => Ok(file_response(&path, req).await),
            Resolved::Redirect(mut location) => {
                if let Some(query) = req.uri().query().filter(|q| !q.is_empty()) {
                    location.push('?');
                    location.push_str(query);
                }
                Ok((
                    StatusCode::MOVED_PERMANENTLY,
                    [(header::LOCATION, location)],
                )
                    .into_response())
            }
            Resolved::Listing(dir) => listing_response(&dir).await,
        }
    }
}

/// `GET request_path` against `root` with the default index file and
/// listings enabled.
pub async fn serve(root: &Path, request_path: &str) -> Result<Response> {
    let req = Request::builder()
        .uri(request_path)
        .body(Body::empty())
        .map_err(|e| Error::invalid_input(format!("bad request path: {}", e)))?;
    StaticFiles::new(root).serve(req).await
}

/// Split a decoded path into segments, rejecting anything that could leave
/// the root.
fn checked_segments(decoded: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || segment.contains('\\') || segment.contains('\0') {
            return Err(Error::invalid_input(format!(
                "rejected path segment {:?}",
                segment
            )));
        }
        // Drive prefixes and anything else that is not a plain name.
        let mut components = Path::new(segment).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) || has_drive_prefix(segment)
        {
            return Err(Error::invalid_input(format!(
                "rejected path segment {:?}",
                segment
            )));
        }
        segments.push(segment);
    }
    Ok(segments)
}

/// Absolute, slash-terminated location for a directory. Built from the
/// checked segments so the redirect can never leave this host.
fn directory_location(segments: &[&str]) -> String {
    let mut location = String::from("/");
    for segment in segments {
        location.push_str(&utf8_percent_encode(segment, HREF_ESCAPE).to_string());
        location.push('/');
    }
    location
}

fn has_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Content type for a file, from its extension. Text types get an explicit
/// UTF-8 charset.
pub fn content_type_for(path: &Path) -> Mime {
    let guessed = mime_guess::from_path(path).first_or_octet_stream();
    let textual = guessed.type_() == mime::TEXT
        || guessed.subtype() == mime::JAVASCRIPT
        || guessed.subtype() == mime::JSON;

    if textual && guessed.get_param(mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", guessed.essence_str())
            .parse()
            .unwrap_or(guessed)
    } else {
        guessed
    }
}

/// Hand a resolved file to `ServeFile`, which streams it and answers
/// `Range`, `If-Modified-Since` and `HEAD`.
async fn file_response(path: &Path, req: Request) -> Response {
    let service = ServeFile::new_with_mime(path, &content_type_for(path));
    match service.oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

async fn listing_response(dir: &Path) -> Result<Response> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        names.push(if is_dir { format!("{}/", name) } else { name });
    }
    names.sort();

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        render_listing(&names),
    )
        .into_response())
}

fn render_listing(names: &[String]) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<meta charset=\"utf-8\">\n<pre>\n");
    for name in names {
        html.push_str(&format!(
            "<a href=\"{}\">{}</a>\n",
            html_escape(&utf8_percent_encode(name, HREF_ESCAPE).to_string()),
            html_escape(name)
        ));
    }
    html.push_str("</pre>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
