//! XHTML page shell, error pages and markup helpers.
//!
//! Error pages and HTML directory listings share one document frame. The
//! frame is produced by a [`PageShell`]; swap in your own through
//! [`Config::shell`](crate::Config::shell) to give every generated page your
//! site's head and foot.

use std::fmt::Write as _;

use crate::status::Status;
use crate::uri::UrlBase;

/// `<?xml ...?>` declaration, newline-terminated.
pub fn xml_header(encoding: &str, version: &str) -> String {
    format!("<?xml version=\"{version}\" encoding=\"{encoding}\"?>\n")
}

/// XSLT processing instruction pointing at `url`, made absolute against `base`.
pub fn xsl_header(base: &UrlBase, url: &str) -> String {
    format!("<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>\n", escape_html(&base.rel2url(url)))
}

/// Escapes `&`, `<`, `>` and `"`. Single quotes are left alone.
pub fn escape_html(s: &str) -> String {
    escape(s, false)
}

/// Like [`escape_html`], but also escapes `'`. Use for attribute values.
pub fn escape_attr(s: &str) -> String {
    escape(s, true)
}

fn escape(s: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' if quotes => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

// ── PageShell ─────────────────────────────────────────────────────────────────

/// What a shell needs to know about the page it frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageInfo<'a> {
    /// Plain text; the shell escapes it.
    pub title: &'a str,
    pub stylesheet: Option<&'a str>,
    /// Parent collection, for "up" navigation on listings.
    pub index_url: Option<&'a str>,
}

/// Renders the document head and foot around generated HTML.
pub trait PageShell: Send + Sync {
    fn html_start(&self, page: &PageInfo<'_>) -> String;
    fn html_end(&self) -> String;
}

/// XHTML 1.0 Strict frame with an optional stylesheet and index link.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultShell;

impl PageShell for DefaultShell {
    fn html_start(&self, page: &PageInfo<'_>) -> String {
        let mut out = xml_header("UTF-8", "1.0");
        out.push_str(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \
             \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">\n\
             <html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"en\">\n<head>\n",
        );
        let _ = writeln!(out, "  <title>{}</title>", escape_html(page.title));
        if let Some(href) = page.stylesheet {
            let _ = writeln!(out, "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\" />", escape_attr(href));
        }
        if let Some(href) = page.index_url {
            let _ = writeln!(
                out,
                "  <link rel=\"index\" rev=\"child\" type=\"application/xhtml+xml\" href=\"{}\" />",
                escape_attr(href),
            );
        }
        out.push_str("</head>\n<body>\n");
        if let Some(href) = page.index_url {
            let _ = writeln!(
                out,
                "<p id=\"p_index\"><a id=\"a_index\" rel=\"index\" rev=\"child\" href=\"{}\">Index</a></p>",
                escape_attr(href),
            );
        }
        out
    }

    fn html_end(&self) -> String {
        "</body></html>".to_owned()
    }
}

/// Full error document for `status`.
///
/// `message` is HTML. Unless it already starts with a tag it is wrapped in
/// `<p id="message">`.
pub fn error_page(shell: &dyn PageShell, status: Status, message: &str, stylesheet: Option<&str>) -> String {
    let title = status.status_line();
    let mut out = shell.html_start(&PageInfo { title: &title, stylesheet, index_url: None });
    let _ = writeln!(out, "<h1 id=\"status_code\">HTTP/1.1 {title}</h1>");
    if message.trim_start().starts_with('<') {
        out.push_str(message);
    } else {
        let _ = write!(out, "<p id=\"message\">{message}</p>");
    }
    out.push('\n');
    out.push_str(&shell.html_end());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_modes() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;'&amp;'&lt;/a&gt;");
        assert_eq!(escape_attr("it's"), "it&#039;s");
    }

    #[test]
    fn xml_and_xsl_headers() {
        assert_eq!(xml_header("UTF-8", "1.0"), "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let base = UrlBase::new(false, "example.org", 80);
        assert_eq!(
            xsl_header(&base, "/style.xsl?a=1&b=2"),
            "<?xml-stylesheet type=\"text/xsl\" href=\"http://example.org/style.xsl?a=1&amp;b=2\"?>\n",
        );
    }

    #[test]
    fn default_shell_frames_page() {
        let page = PageInfo { title: "A & B", stylesheet: Some("/style.css"), index_url: Some("/docs/") };
        let head = DefaultShell.html_start(&page);
        assert!(head.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html"));
        assert!(head.contains("<title>A &amp; B</title>"));
        assert!(head.contains("href=\"/style.css\""));
        assert!(head.contains("<a id=\"a_index\" rel=\"index\" rev=\"child\" href=\"/docs/\">Index</a>"));
        assert_eq!(DefaultShell.html_end(), "</body></html>");
    }

    #[test]
    fn error_page_wraps_plain_messages() {
        let page = error_page(&DefaultShell, Status::NotFound, "No such item", None);
        assert!(page.contains("<title>404 Not Found</title>"));
        assert!(page.contains("<h1 id=\"status_code\">HTTP/1.1 404 Not Found</h1>"));
        assert!(page.contains("<p id=\"message\">No such item</p>"));
        assert!(page.ends_with("</body></html>"));
        assert!(!page.contains("stylesheet"));
    }

    #[test]
    fn error_page_keeps_markup_messages() {
        let page = error_page(&DefaultShell, Status::Gone, "  <ul><li>x</li></ul>", Some("/s.css"));
        assert!(page.contains("  <ul><li>x</li></ul>"));
        assert!(!page.contains("id=\"message\""));
        assert!(page.contains("href=\"/s.css\""));
    }
}
