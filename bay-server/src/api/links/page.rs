use axum::response::Html;
use shared::{AppError, ErrorCode};

pub const EXPIRED_TITLE: &str = "Link already used or expired";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{body}</p></body></html>",
        title = escape(title),
        body = escape(body),
    ))
}

pub fn expired() -> Html<String> {
    render(
        EXPIRED_TITLE,
        "This link has already been used, was replaced, or the request was withdrawn.",
    )
}

/// 失败结果也渲染成页面
pub fn from_error(err: &AppError) -> Html<String> {
    match err.code {
        ErrorCode::CapabilityInvalid => expired(),
        code if err.is_business() => render("Request could not be completed", code.message()),
        _ => {
            tracing::error!(code = %err.code, message = %err.message, "Link handling failed");
            render(
                "Something went wrong",
                "Please try again later or sign in to finish this action.",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_escapes() {
        let Html(page) = render("<b>", "a & b");
        assert!(page.contains("&lt;b&gt;"));
        assert!(page.contains("a &amp; b"));
    }

    #[test]
    fn test_capability_error_shows_expired() {
        let Html(page) = from_error(&AppError::capability_invalid());
        assert!(page.contains(EXPIRED_TITLE));
    }
}
