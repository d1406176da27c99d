//! Built-in form auto-fill value table (spec.md §4.4 step 5).
//!
//! Given the elements of a parsed `<form>`, fills in values for fields the
//! page did not pre-populate: text-like inputs get a value keyed by
//! `type`/`name` pattern, `<select>` picks its first `<option>`, and
//! checkboxes default to checked. There is no upstream reference for this
//! table (`original_source/` only carries the scheduler, not nyawc's form
//! helper) — it is a reasonable built-in table for a crawler of this shape,
//! not lifted from a specific source file (see DESIGN.md).

/// One form field as scraped from the page.
#[derive(Clone, Debug)]
pub struct FormElement {
  pub name: String,
  pub input_type: String,
  /// `<option>` values, only populated for `<select>`.
  pub options: Vec<String>,
  /// Value already present in the markup (`value="..."` or pre-checked).
  pub existing_value: Option<String>,
}

fn builtin_value(input_type: &str, name: &str) -> String {
  let name = name.to_ascii_lowercase();
  match input_type {
    "email" => "user@example.com".to_string(),
    "tel" => "+15555550100".to_string(),
    "url" => "https://example.com".to_string(),
    "number" | "range" => "1".to_string(),
    "date" => "2024-01-01".to_string(),
    "password" => "Password123!".to_string(),
    "hidden" => String::new(),
    _ if name.contains("email") => "user@example.com".to_string(),
    _ if name.contains("phone") || name.contains("tel") => "+15555550100".to_string(),
    _ if name.contains("name") => "Test User".to_string(),
    _ if name.contains("zip") || name.contains("postal") => "12345".to_string(),
    _ => "test".to_string(),
  }
}

/// Fills in missing values for `elements`, returning the final
/// `(name, value)` pairs to submit.
pub fn autofill(elements: &[FormElement]) -> Vec<(String, String)> {
  let mut data = Vec::with_capacity(elements.len());

  for element in elements {
    match element.input_type.as_str() {
      "checkbox" => {
        data.push((
          element.name.clone(),
          element.existing_value.clone().unwrap_or_else(|| "on".to_string()),
        ));
      }
      "radio" => {
        if data.iter().any(|(name, _)| name == &element.name) {
          continue;
        }
        let value = element
          .existing_value
          .clone()
          .unwrap_or_else(|| "on".to_string());
        data.push((element.name.clone(), value));
      }
      "select" => {
        let value = element
          .existing_value
          .clone()
          .or_else(|| element.options.first().cloned())
          .unwrap_or_default();
        data.push((element.name.clone(), value));
      }
      "submit" | "button" | "reset" => {}
      other => {
        let value = element
          .existing_value
          .clone()
          .unwrap_or_else(|| builtin_value(other, &element.name));
        data.push((element.name.clone(), value));
      }
    }
  }

  data
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn text_field_gets_placeholder() {
    let elements = vec![FormElement {
      name: "username".into(),
      input_type: "text".into(),
      options: vec![],
      existing_value: None,
    }];
    let data = autofill(&elements);
    assert_eq!(data, vec![("username".to_string(), "test".to_string())]);
  }

  #[test]
  fn email_field_by_type() {
    let elements = vec![FormElement {
      name: "contact".into(),
      input_type: "email".into(),
      options: vec![],
      existing_value: None,
    }];
    assert_eq!(
      autofill(&elements),
      vec![("contact".to_string(), "user@example.com".to_string())]
    );
  }

  #[test]
  fn existing_value_is_preserved() {
    let elements = vec![FormElement {
      name: "csrf_token".into(),
      input_type: "hidden".into(),
      options: vec![],
      existing_value: Some("abc123".into()),
    }];
    assert_eq!(
      autofill(&elements),
      vec![("csrf_token".to_string(), "abc123".to_string())]
    );
  }

  #[test]
  fn checkbox_defaults_to_checked() {
    let elements = vec![FormElement {
      name: "subscribe".into(),
      input_type: "checkbox".into(),
      options: vec![],
      existing_value: None,
    }];
    assert_eq!(
      autofill(&elements),
      vec![("subscribe".to_string(), "on".to_string())]
    );
  }

  #[test]
  fn select_picks_first_option() {
    let elements = vec![FormElement {
      name: "country".into(),
      input_type: "select".into(),
      options: vec!["US".into(), "CA".into()],
      existing_value: None,
    }];
    assert_eq!(
      autofill(&elements),
      vec![("country".to_string(), "US".to_string())]
    );
  }

  #[test]
  fn submit_buttons_are_not_submitted_as_fields() {
    let elements = vec![FormElement {
      name: "submit".into(),
      input_type: "submit".into(),
      options: vec![],
      existing_value: Some("Go".into()),
    }];
    assert!(autofill(&elements).is_empty());
  }

  #[test]
  fn radio_group_only_submits_one_value() {
    let elements = vec![
      FormElement {
        name: "plan".into(),
        input_type: "radio".into(),
        options: vec![],
        existing_value: Some("basic".into()),
      },
      FormElement {
        name: "plan".into(),
        input_type: "radio".into(),
        options: vec![],
        existing_value: Some("pro".into()),
      },
    ];
    assert_eq!(
      autofill(&elements),
      vec![("plan".to_string(), "basic".to_string())]
    );
  }
}
