use axum::response::Html;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Parley Chat Demo</title>
  </head>
  <body>
    <h1>Parley Chat Demo</h1>
    <p>A small REST chat service. Register with <code>POST /api/users</code>,
       sign in with <code>POST /api/auth/login</code> and send the returned token
       as <code>Authorization: Bearer &lt;token&gt;</code>.</p>
    <p>The full API is described at <a href="/docs">/docs</a>.</p>
  </body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
