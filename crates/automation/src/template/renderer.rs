//! Jinja2-style rendering of message templates using minijinja.
//!
//! Action configurations personalize subjects and bodies against the
//! triggering event's payload, e.g. `"Welcome {{ member.first_name }}!"`.

use minijinja::Environment;

use crate::error::{AppError, AppResult};

/// Template renderer for action configuration strings.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Unknown fields render as empty strings instead of failing the
        // whole message.
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);

        Self { env }
    }

    /// Render a template string against the event payload.
    pub fn render(&self, template: &str, payload: &serde_json::Value) -> AppResult<String> {
        // Quick path for plain strings
        if !contains_template_syntax(template) {
            return Ok(template.to_string());
        }

        let tmpl = self
            .env
            .template_from_str(template)
            .map_err(|e| AppError::Template(format!("Template parse error: {}", e)))?;

        tmpl.render(payload)
            .map_err(|e| AppError::Template(format!("Template render error: {}", e)))
    }

    /// Render every string leaf of a JSON value recursively.
    pub fn render_value(
        &self,
        value: &serde_json::Value,
        payload: &serde_json::Value,
    ) -> AppResult<serde_json::Value> {
        match value {
            serde_json::Value::String(s) => {
                Ok(serde_json::Value::String(self.render(s, payload)?))
            }
            serde_json::Value::Object(map) => {
                let mut result = serde_json::Map::new();
                for (k, v) in map {
                    result.insert(k.clone(), self.render_value(v, payload)?);
                }
                Ok(serde_json::Value::Object(result))
            }
            serde_json::Value::Array(arr) => {
                let result: Result<Vec<_>, _> =
                    arr.iter().map(|v| self.render_value(v, payload)).collect();
                Ok(serde_json::Value::Array(result?))
            }
            _ => Ok(value.clone()),
        }
    }
}

/// Check if a string contains Jinja2 template syntax.
fn contains_template_syntax(s: &str) -> bool {
    (s.contains("{{") && s.contains("}}")) || (s.contains("{%") && s.contains("%}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_plain_string() {
        let renderer = TemplateRenderer::new();
        let out = renderer.render("Thank you for giving", &json!({})).unwrap();
        assert_eq!(out, "Thank you for giving");
    }

    #[test]
    fn test_render_with_payload_fields() {
        let renderer = TemplateRenderer::new();
        let payload = json!({"member": {"first_name": "Grace"}, "amount": 500});
        let out = renderer
            .render("Asante {{ member.first_name }}, KES {{ amount }} received", &payload)
            .unwrap();
        assert_eq!(out, "Asante Grace, KES 500 received");
    }

    #[test]
    fn test_render_missing_field_is_empty() {
        let renderer = TemplateRenderer::new();
        let out = renderer.render("Hello {{ nobody }}!", &json!({})).unwrap();
        assert_eq!(out, "Hello !");
    }

    #[test]
    fn test_render_value_recurses() {
        let renderer = TemplateRenderer::new();
        let payload = json!({"name": "Grace"});
        let value = json!({
            "subject": "Hi {{ name }}",
            "nested": {"body": "Bye {{ name }}"},
            "count": 3
        });
        let out = renderer.render_value(&value, &payload).unwrap();
        assert_eq!(out["subject"], "Hi Grace");
        assert_eq!(out["nested"]["body"], "Bye Grace");
        assert_eq!(out["count"], 3);
    }

    #[test]
    fn test_render_invalid_template_errors() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render("{{ 1 + }}", &json!({}));
        assert!(result.is_err());
    }
}
