/// Full-screen maintenance notice
pub fn maintenance_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex">
    <title>Under Maintenance</title>
    <style>
        body {{
            margin: 0;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            font-family: system-ui, sans-serif;
            background: #f3f4f6;
            color: #1f2937;
        }}
        main {{
            max-width: 36rem;
            padding: 2.5rem;
            text-align: center;
            background: #fff;
            border-radius: 1rem;
            box-shadow: 0 10px 30px rgba(0, 0, 0, 0.08);
        }}
        h1 {{ margin-top: 0; font-size: 1.75rem; }}
        p.notice {{ font-size: 1.1rem; line-height: 1.6; white-space: pre-line; }}
    </style>
</head>
<body>
    <main>
        <h1>We'll be back soon</h1>
        <p class="notice">{message}</p>
    </main>
</body>
</html>
"#,
        message = escape_html(message),
    )
}

/// Placeholder shown until the first status read finishes
pub fn loading_page() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta http-equiv="refresh" content="1">
    <title>Loading…</title>
    <style>
        body { margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center; }
        .spinner { width: 3rem; height: 3rem; border: 4px solid #d1d5db; border-top-color: #2563eb; border-radius: 50%; animation: spin 1s linear infinite; }
        @keyframes spin { to { transform: rotate(360deg); } }
    </style>
</head>
<body>
    <div class="spinner" role="status" aria-label="Loading"></div>
</body>
</html>
"#
    .to_string()
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
