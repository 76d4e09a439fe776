use sentry_html::scope::{Scope, ScopeRegistry, ScopeRuleConfig};
use sentry_html::{rules, Config, FixOptions, Severity, SourceKind, Sentry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::default();
    config.fail_on_warnings = true;
    config.max_warnings = Some(10);

    let mut scopes = ScopeRegistry::new();
    scopes.register(
        Scope::new("marketing-pages", "Marketing pages")
            .with_file_glob("marketing/**/*.html")
            .with_rule(
                "images-alt-text",
                ScopeRuleConfig { severity: Some(Severity::Warning), ..Default::default() },
            ),
    )?;

    let sentry = Sentry::new(rules::builtin_rules(), config)?.with_scopes(scopes);

    let html = r#"<img src="banner.jpg"><a href="https://x.example" target="_blank">x</a>"#;
    let scoped = sentry.check_scoped(html, SourceKind::Html, "marketing/landing.html", true);

    for violation in &scoped.base.violations {
        println!("[{}] {} (scope: {:?})", violation.rule_id, violation.message, violation.scope);
    }

    let edits: Vec<_> = scoped.base.violations.iter().filter_map(|v| v.fix.clone()).collect();
    let fixed = sentry_html::fix::apply_fixes(html, &edits, &FixOptions::default());
    println!("Fixed HTML:\n{}", fixed.fixed);

    Ok(())
}
