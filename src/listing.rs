//! Directory listings in whatever format the client prefers.
//!
//! One logical listing (a name per line plus named columns) renders as an
//! XHTML table, tab-delimited text, CSV, or JSON. [`Listing::negotiate`] picks
//! the format from the request's `Accept` header:
//!
//! | Offered type | Weight | Format |
//! |---|---|---|
//! | `application/xhtml+xml` or `text/html` | 1.0 | [`Format::Html`] |
//! | `text/plain` | 0.3 | [`Format::Plain`] |
//! | `text/tdv` | 0.5 | [`Format::Plain`] |
//! | `text/csv` | 0.8 | [`Format::Csv`] |
//! | `application/json` | 1.0 | [`Format::Json`] |
//!
//! A client that accepts none of them gets HTML.
//!
//! ```rust
//! use restkit::{Listing, Request};
//!
//! let req = Request::builder().uri("/docs/").header("accept", "text/csv").build();
//! let mut listing = Listing::negotiate(&req, None);
//! listing.line("report.pdf", &[("Size", "1024")]);
//! listing.line("archive/", &[("Size", "")]);
//! let response = listing.end();
//! assert_eq!(response.header("content-type"), Some("text/csv; charset=UTF-8"));
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::page::{DefaultShell, PageInfo, PageShell, escape_attr, escape_html};
use crate::request::Request;
use crate::response::Response;
use crate::uri::urldecode;

/// Info column rendered verbatim in HTML and dropped from text formats.
pub const HTML_COLUMN: &str = "HTML";

/// Output format of a [`Listing`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Html,
    Plain,
    Csv,
    Json,
}

impl Format {
    /// Format for a negotiated media type. Unknown types render as HTML.
    pub fn from_media_type(media_type: &str) -> Self {
        match media_type {
            "text/plain" | "text/tdv" => Self::Plain,
            "text/csv" => Self::Csv,
            "application/json" => Self::Json,
            _ => Self::Html,
        }
    }
}

/// The offer set listings negotiate with, best XHTML type first.
pub fn offers(xhtml_type: &str) -> [(&str, f64); 5] {
    [
        (xhtml_type, 1.0),
        ("text/plain", 0.3),
        ("text/tdv", 0.5),
        ("text/csv", 0.8),
        ("application/json", 1.0),
    ]
}

/// A directory listing being rendered.
///
/// Feed it with [`line`](Self::line) and finish with [`end`](Self::end).
/// Column headers default to the info keys of the first line.
pub struct Listing {
    format: Format,
    media_type: String,
    title: String,
    index_url: Option<String>,
    stylesheet: Option<String>,
    shell: Arc<dyn PageShell>,
    form: String,
    columns: Option<Vec<String>>,
    started: bool,
    out: String,
    rows: Vec<Value>,
}

impl Listing {
    /// Negotiates the format against `req` and sets up the listing.
    ///
    /// `title` is plain text. Without one the title is `Index for ` followed
    /// by the request path up to and including its last `/`.
    pub fn negotiate(req: &Request, title: Option<&str>) -> Self {
        let xhtml = req.best_xhtml_type();
        let media = req
            .best_content_type(&offers(xhtml), Some(xhtml))
            .unwrap_or_else(|_| xhtml.to_owned());
        let format = Format::from_media_type(&media);
        debug!(?format, %media, "directory listing");

        let path = req.path();
        let title = match title {
            Some(t) => t.to_owned(),
            None => default_title(path),
        };
        let config = req.config();
        Self {
            media_type: format!("{media}; charset=UTF-8"),
            index_url: Some(parent_url(path)),
            stylesheet: config.stylesheet.clone(),
            shell: Arc::clone(&config.shell),
            ..Self::new(format, &title)
        }
    }

    /// A listing in a fixed format with the default page shell.
    pub fn new(format: Format, title: &str) -> Self {
        let media = match format {
            Format::Html => "application/xhtml+xml",
            Format::Plain => "text/plain",
            Format::Csv => "text/csv",
            Format::Json => "application/json",
        };
        Self {
            format,
            media_type: format!("{media}; charset=UTF-8"),
            title: title.to_owned(),
            index_url: None,
            stylesheet: None,
            shell: Arc::new(DefaultShell),
            form: String::new(),
            columns: None,
            started: false,
            out: String::new(),
            rows: Vec::new(),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// `Content-Type` value of the rendered listing.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// HTML placed between the page head and the table (HTML format only).
    pub fn form(mut self, html: impl Into<String>) -> Self {
        self.form = html.into();
        self
    }

    /// Column headers, in display order.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds one entry. `name` is URL-encoded; a trailing `/` marks a
    /// collection.
    pub fn line(&mut self, name: &str, info: &[(&str, &str)]) {
        match self.format {
            Format::Html => self.html_line(name, info),
            Format::Plain => self.plain_line(name, info),
            Format::Csv => self.csv_line(name, info),
            Format::Json => self.json_line(name, info),
        }
    }

    /// Finishes the listing as a `200 OK` response.
    pub fn end(mut self) -> Response {
        if self.format == Format::Json {
            self.out = if self.rows.is_empty() {
                Value::Null.to_string()
            } else {
                Value::Array(std::mem::take(&mut self.rows)).to_string()
            };
        } else {
            self.start(&[]);
            if self.format == Format::Html {
                self.out.push_str("</tbody></table>");
                self.out.push_str(&self.shell.html_end());
            }
        }
        Response::builder()
            .content_type(&self.media_type)
            .body(self.out.into_bytes())
    }

    /// Emits the column header once, defaulting the columns to `info`'s keys.
    fn start(&mut self, info: &[(&str, &str)]) {
        if self.started {
            return;
        }
        self.started = true;
        let keep_html = self.format == Format::Html;
        let columns = self.columns.get_or_insert_with(|| {
            info.iter()
                .map(|(k, _)| *k)
                .filter(|k| keep_html || *k != HTML_COLUMN)
                .map(str::to_owned)
                .collect()
        });

        let out = &mut self.out;
        match self.format {
            Format::Plain => {
                out.push_str("Name");
                for c in columns.iter() {
                    let _ = write!(out, "\t{}", c.replace('\t', "\\t"));
                }
                out.push_str("\r\n");
            }
            Format::Csv => {
                out.push_str("\"Name\"");
                for c in columns.iter() {
                    let _ = write!(out, ",\"{}\"", c.replace('"', "\"\""));
                }
                out.push_str("\r\n");
            }
            Format::Html => {
                let page = PageInfo {
                    title: &self.title,
                    stylesheet: self.stylesheet.as_deref(),
                    index_url: self.index_url.as_deref(),
                };
                out.push_str(&self.shell.html_start(&page));
                out.push_str(&self.form);
                out.push_str(
                    "<h2>Contents</h2>\n\
                     <table class=\"toc\" id=\"directory_index\"><tbody>\n\
                     <tr><th class=\"delete\"></th><th class=\"name\">Name</th>",
                );
                for c in columns.iter() {
                    let _ = write!(out, "<th class=\"{}\">{}</th>", css_class(c), escape_attr(c));
                }
                out.push_str("</tr>\n");
            }
            Format::Json => {}
        }
    }

    fn plain_line(&mut self, name: &str, info: &[(&str, &str)]) {
        self.start(info);
        self.out.push_str(&escape_controls(name));
        for c in self.columns.iter().flatten() {
            let value = text_value(info, c).map(escape_controls).unwrap_or_default();
            let _ = write!(self.out, "\t{value}");
        }
        self.out.push_str("\r\n");
    }

    fn csv_line(&mut self, name: &str, info: &[(&str, &str)]) {
        self.start(info);
        let _ = write!(self.out, "\"{}", name.replace('"', "\"\""));
        for c in self.columns.iter().flatten() {
            let value = text_value(info, c).map(|v| v.replace('"', "\"\"")).unwrap_or_default();
            let _ = write!(self.out, "\",\"{value}");
        }
        self.out.push_str("\"\r\n");
    }

    fn html_line(&mut self, name: &str, info: &[(&str, &str)]) {
        self.start(info);
        let path = name.split_once('?').map_or(name, |(path, _)| path);
        let decoded = urldecode(path);
        let class = if path.ends_with('/') { "collection" } else { "resource" };
        let separator = if name.contains('?') { "&amp;" } else { "?" };
        let href = escape_attr(name);

        let out = &mut self.out;
        let _ = write!(
            out,
            "<tr class=\"{class}\"><td class=\"delete\"><form action=\"{href}{separator}http_method=DELETE\" \
             method=\"post\"><input type=\"submit\" value=\"X\" title=\"Delete {}\"/></form></td>\
             <td class=\"name\"><a rel=\"child\" href=\"{href}\">{}</a></td>",
            escape_attr(&decoded),
            escape_html(&decoded),
        );
        for c in self.columns.iter().flatten() {
            let _ = write!(out, "<td class=\"{}\">", css_class(c));
            if let Some(value) = lookup(info, c) {
                if c == HTML_COLUMN {
                    out.push_str(value);
                } else {
                    out.push_str(&escape_html(value));
                }
            }
            out.push_str("</td>\n");
        }
        out.push_str("</tr>\n");
    }

    fn json_line(&mut self, name: &str, info: &[(&str, &str)]) {
        let mut row = Map::new();
        for (k, v) in info {
            row.insert((*k).to_owned(), Value::String((*v).to_owned()));
        }
        row.insert("Name".to_owned(), Value::String(name.to_owned()));
        self.rows.push(Value::Object(row));
    }
}

fn lookup<'a>(info: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    info.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Column value for the text formats, which never show the HTML column.
fn text_value<'a>(info: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    if key == HTML_COLUMN { None } else { lookup(info, key) }
}

fn escape_controls(s: &str) -> String {
    s.replace('\t', "\\t").replace('\r', "\\r").replace('\n', "\\n")
}

/// Column header reduced to `[a-z0-9_]` for use as a CSS class.
fn css_class(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn default_title(path: &str) -> String {
    let dir = path.rfind('/').map_or("", |i| &path[..i]);
    format!("Index for {dir}/")
}

/// The collection containing `path`, always `/`-terminated.
fn parent_url(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => format!("{}/", &trimmed[..i]),
        None => "/".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::config::Config;

    use super::*;

    fn render(listing: Listing) -> String {
        String::from_utf8(listing.end().body().to_vec()).unwrap()
    }

    fn request(accept: &str) -> Request {
        Request::builder().uri("/files/sub/?sort=name").header("accept", accept).build()
    }

    #[rstest]
    #[case("text/csv", Format::Csv, "text/csv; charset=UTF-8")]
    #[case("application/json", Format::Json, "application/json; charset=UTF-8")]
    #[case("text/plain", Format::Plain, "text/plain; charset=UTF-8")]
    #[case("text/tdv", Format::Plain, "text/tdv; charset=UTF-8")]
    #[case("text/*", Format::Csv, "text/csv; charset=UTF-8")]
    #[case("*/*", Format::Html, "application/xhtml+xml; charset=UTF-8")]
    #[case("image/png", Format::Html, "application/xhtml+xml; charset=UTF-8")]
    #[case("text/plain;q=1, text/csv;q=0.3", Format::Plain, "text/plain; charset=UTF-8")]
    fn negotiates_format(#[case] accept: &str, #[case] format: Format, #[case] media: &str) {
        let listing = Listing::negotiate(&request(accept), None);
        assert_eq!(listing.format(), format);
        assert_eq!(listing.media_type(), media);
    }

    #[test]
    fn internet_explorer_gets_text_html() {
        let req = Request::builder().header("user-agent", "Mozilla/4.0 (compatible; MSIE 8.0)").build();
        let listing = Listing::negotiate(&req, None);
        assert_eq!(listing.format(), Format::Html);
        assert_eq!(listing.media_type(), "text/html; charset=UTF-8");
    }

    #[test]
    fn plain_escapes_controls_and_drops_html() {
        let mut listing = Listing::new(Format::Plain, "t");
        listing.line("a\tb.txt", &[("Size", "12"), ("HTML", "<b>x</b>"), ("Note", "two\nlines")]);
        listing.line("c/", &[("Note", "n")]);
        assert_eq!(render(listing), "Name\tSize\tNote\r\na\\tb.txt\t12\ttwo\\nlines\r\nc/\t\tn\r\n");
    }

    #[test]
    fn csv_quotes_every_cell() {
        let mut listing = Listing::new(Format::Csv, "t").columns(["Size", "Say \"hi\""]);
        listing.line("x\"y", &[("Size", "3"), ("Say \"hi\"", "ok")]);
        assert_eq!(
            render(listing),
            "\"Name\",\"Size\",\"Say \"\"hi\"\"\"\r\n\"x\"\"y\",\"3\",\"ok\"\r\n",
        );
    }

    #[test]
    fn explicit_html_column_stays_empty_in_csv() {
        let mut listing = Listing::new(Format::Csv, "t").columns(["HTML"]);
        listing.line("a", &[("HTML", "<i>x</i>")]);
        assert_eq!(render(listing), "\"Name\",\"HTML\"\r\n\"a\",\"\"\r\n");
    }

    #[test]
    fn empty_text_listings_still_have_headers() {
        assert_eq!(render(Listing::new(Format::Csv, "t")), "\"Name\"\r\n");
        assert_eq!(render(Listing::new(Format::Plain, "t").columns(["Size"])), "Name\tSize\r\n");
    }

    #[test]
    fn json_rows_keep_info_order_then_name() {
        let mut listing = Listing::new(Format::Json, "t");
        listing.line("a.txt", &[("Size", "1"), ("HTML", "<b/>")]);
        listing.line("b/", &[]);
        assert_eq!(
            render(listing),
            r#"[{"Size":"1","HTML":"<b/>","Name":"a.txt"},{"Name":"b/"}]"#,
        );
    }

    #[test]
    fn empty_json_listing_is_null() {
        assert_eq!(render(Listing::new(Format::Json, "t")), "null");
    }

    #[test]
    fn html_rows() {
        let mut listing = Listing::new(Format::Html, "Index for /files/").form("<form id=\"upload\"/>");
        listing.line("my%20dir/", &[("Size", ""), ("HTML", "<em>new</em>")]);
        listing.line("a&b.txt?v=2", &[("Size", "<1k"), ("HTML", "")]);
        let html = render(listing);

        assert!(html.contains("<title>Index for /files/</title>"));
        assert!(html.contains("<form id=\"upload\"/><h2>Contents</h2>"));
        assert!(html.contains("<th class=\"size\">Size</th><th class=\"html\">HTML</th></tr>"));
        assert!(html.contains(
            "<tr class=\"collection\"><td class=\"delete\"><form action=\"my%20dir/?http_method=DELETE\""
        ));
        assert!(html.contains("title=\"Delete my dir/\""));
        assert!(html.contains("<a rel=\"child\" href=\"my%20dir/\">my dir/</a>"));
        assert!(html.contains("<td class=\"html\"><em>new</em></td>"));
        assert!(html.contains("<tr class=\"resource\">"));
        assert!(html.contains("action=\"a&amp;b.txt?v=2&amp;http_method=DELETE\""));
        assert!(html.contains("<td class=\"size\">&lt;1k</td>"));
        assert!(html.ends_with("</tbody></table></body></html>"));
    }

    #[test]
    fn negotiated_html_uses_request_context() {
        let req = Request::builder()
            .uri("/files/sub/")
            .config(Config::new().stylesheet("/style.css"))
            .build();
        let html = render(Listing::negotiate(&req, None));
        assert!(html.contains("<title>Index for /files/sub/</title>"));
        assert!(html.contains("href=\"/style.css\""));
        assert!(html.contains("<a id=\"a_index\" rel=\"index\" rev=\"child\" href=\"/files/\">Index</a>"));
    }

    #[rstest]
    #[case("/files/sub/", "Index for /files/sub/", "/files/")]
    #[case("/files/report.pdf", "Index for /files/", "/files/")]
    #[case("/", "Index for /", "/")]
    fn titles_and_parents(#[case] path: &str, #[case] title: &str, #[case] parent: &str) {
        assert_eq!(default_title(path), title);
        assert_eq!(parent_url(path), parent);
    }
}
