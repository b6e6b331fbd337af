//! Minimal template renderer
//!
//! Supports `{{ name }}` variable interpolation and nothing else; the three
//! server-config templates need path, port and cache-directory substitution
//! only. Rendering is pure: the caller decides where the text goes.
//!
//! An unresolved placeholder is an error so a typo in a template or a
//! missing variable can never leak `{{ tokens }}` into a live config file.

use crate::error::{ProvisionError, Result};

/// Render a template by substituting `{{ name }}` placeholders.
///
/// Whitespace inside the braces is ignored, so `{{srv_path}}` and
/// `{{ srv_path }}` are equivalent. Variables that never appear in the
/// template are silently unused.
pub fn render(template: &str, vars: &[(String, String)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            return Err(ProvisionError::template(format!(
                "unterminated placeholder near: {}",
                &rest[start..rest.len().min(start + 24)]
            )));
        };

        let name = after[..end].trim();
        if name.is_empty() {
            return Err(ProvisionError::template("empty placeholder name"));
        }

        let value = vars
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| {
                ProvisionError::template(format!("no value for placeholder `{}`", name))
            })?;

        out.push_str(value);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
