use sentry_html::{rules, Config, Sentry, SourceKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sentry = Sentry::new(rules::builtin_rules(), Config::default())?;

    let html = r#"
        <html>
            <body>
                <img src="hero.jpg">
                <a href="https://example.com" target="_blank">read more</a>
            </body>
        </html>
    "#;

    let result = sentry.check(html, SourceKind::Html, "index.html");
    for violation in &result.violations {
        println!(
            "{}:{} [{}] {}",
            violation.line, violation.column, violation.rule_id, violation.message
        );
    }
    println!(
        "{} errors, {} warnings, {} info",
        result.error_count, result.warning_count, result.info_count
    );

    Ok(())
}
