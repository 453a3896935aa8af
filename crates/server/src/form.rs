//! HTML form page bound to the inference handler
//!
//! Seven numeric inputs in model order, three outputs: the predicted label,
//! the failure probability and the per-feature SHAP values.

use predictor_lib::{PredictionResult, FEATURE_NAMES};
use std::collections::HashMap;
use std::fmt::Write;

/// Static page text
#[derive(Debug, Clone)]
pub struct PageInfo {
    pub title: String,
    pub description: String,
}

/// What to show below the form
pub enum Outcome<'a> {
    Prediction(&'a PredictionResult),
    Error(String),
}

/// Generic text shown when a model service fails
pub const SERVICE_ERROR_TEXT: &str =
    "Prediction failed. The model could not process this request.";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;max-width:44rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:.6rem;font-weight:600}\
input{width:100%;padding:.3rem}\
button{margin-top:1rem;padding:.5rem 1.2rem}\
.output{margin-top:1.5rem}\
.error{color:#a40000;border:1px solid #a40000;padding:.6rem}\
table{border-collapse:collapse;width:100%}\
td,th{border:1px solid #ccc;padding:.3rem;text-align:left}";

/// Render the full page, keeping previously submitted values in the inputs
pub fn render_page(
    page: &PageInfo,
    values: &HashMap<String, String>,
    outcome: Option<Outcome<'_>>,
) -> String {
    let mut html = String::new();
    let title = escape(&page.title);

    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body><h1>{title}</h1><p>{}</p>\
         <form method=\"post\" action=\"/\">",
        escape(&page.description)
    );

    for name in FEATURE_NAMES {
        let value = values.get(name).map(|v| escape(v)).unwrap_or_default();
        let _ = write!(
            html,
            "<label for=\"{name}\">{name}</label>\
             <input type=\"number\" step=\"any\" id=\"{name}\" name=\"{name}\" \
             value=\"{value}\" required>"
        );
    }
    html.push_str("<button type=\"submit\">Submit</button></form>");

    match outcome {
        Some(Outcome::Prediction(result)) => render_prediction(&mut html, result),
        Some(Outcome::Error(message)) => {
            let _ = write!(html, "<div class=\"output error\">{}</div>", escape(&message));
        }
        None => {}
    }

    html.push_str("</body></html>");
    html
}

fn render_prediction(html: &mut String, result: &PredictionResult) {
    let _ = write!(
        html,
        "<div class=\"output\"><label>Prediction</label><output id=\"label\">{}</output>\
         <label>Failure Probability</label><output id=\"probability\">{}</output>\
         <label>SHAP Values</label><table id=\"shap\">\
         <tr><th>Feature</th><th>Contribution</th></tr>",
        result.label, result.probability
    );
    for (name, value) in result.ordered_attributions() {
        let _ = write!(html, "<tr><td>{name}</td><td>{value}</td></tr>");
    }
    html.push_str("</table>");
    if let Some(base) = result.base_value {
        let _ = write!(html, "<p>Base value: {base}</p>");
    }
    html.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use predictor_lib::PredictionLabel;

    fn page() -> PageInfo {
        PageInfo {
            title: "Machine Failure Prediction".to_string(),
            description: "Enter <sensor> readings".to_string(),
        }
    }

    #[test]
    fn test_empty_form_lists_every_feature() {
        let html = render_page(&page(), &HashMap::new(), None);
        for name in FEATURE_NAMES {
            assert!(html.contains(&format!("name=\"{}\"", name)), "missing input {}", name);
        }
        assert!(html.contains("Enter &lt;sensor&gt; readings"));
        assert!(!html.contains("Failure Probability"));
    }

    #[test]
    fn test_prediction_rendered_in_feature_order() {
        let attributions = FEATURE_NAMES
            .iter()
            .rev()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i as f64))
            .collect();
        let result = PredictionResult {
            label: PredictionLabel::NoFailure,
            probability: 0.25,
            attributions,
            base_value: None,
        };

        let html = render_page(&page(), &HashMap::new(), Some(Outcome::Prediction(&result)));
        assert!(html.contains("No Failure"));
        assert!(html.contains(">0.25<"));
        let first = html.find("<td>rotational_speed_scaled</td>").unwrap();
        let last = html.find("<td>torque_x_rotspeed_x_toolwear_scaled</td>").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_values_and_errors_are_escaped() {
        let mut values = HashMap::new();
        values.insert("torque_scaled".to_string(), "\"><script>".to_string());

        let html = render_page(&page(), &values, Some(Outcome::Error("bad <input>".to_string())));
        assert!(!html.contains("<script>"));
        assert!(html.contains("bad &lt;input&gt;"));
    }
}
