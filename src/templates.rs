//! Endpoint URL templates and `{{key}}` rendering.

pub const GEMINI_GENERATE_CONTENT: &str =
    "{{gemini_base}}/v1beta/models/{{model}}:generateContent";
pub const GEMINI_GENERATE_IMAGE: &str = "{{gemini_base}}/v1beta/models/{{model}}:generateImage";
pub const VERTEX_GENERATE_CONTENT: &str = "{{vertex_base}}/v1/projects/{{project}}/locations/{{location}}/publishers/google/models/{{model}}:generateContent";
pub const VERTEX_PREDICT: &str = "{{vertex_base}}/v1/projects/{{project}}/locations/{{location}}/publishers/google/models/{{model}}:predict";

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// True if any `{{...}}` placeholder survived rendering.
pub fn has_placeholders(rendered: &str) -> bool {
    rendered
        .find("{{")
        .is_some_and(|start| rendered[start..].contains("}}"))
}
