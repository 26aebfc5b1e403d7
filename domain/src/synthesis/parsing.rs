//! Action item parsing for the synthesis step.
//!
//! The synthesis prompt asks for a JSON array of strings, but models wrap
//! their answer in prose or code fences often enough that the parser looks
//! for the list instead of requiring the whole response to be JSON.
//!
//! | Accepted shape | Example |
//! |----------------|---------|
//! | Bare array | `["a", "b", "c"]` |
//! | Array inside prose or a fenced block | ```` ```json\n["a"]\n``` ```` |
//! | Object with a list field | `{"action_items": ["a"]}` or `{"actionItems": [...]}` |

use serde_json::Value;

/// Upper bound on the number of action items kept from a synthesis.
pub const MAX_ACTION_ITEMS: usize = 5;

/// Extract action items from a synthesis response.
///
/// Returns `None` when no list can be found. Items are trimmed, empty
/// items dropped and at most [`MAX_ACTION_ITEMS`] kept. The prompt asks for
/// three to five items, but a shorter list is still returned as is.
///
/// # Examples
///
/// ```
/// use roundtable_domain::synthesis::parse_action_items;
///
/// let items = parse_action_items(r#"["Ship it", " Write docs "]"#).unwrap();
/// assert_eq!(items, vec!["Ship it", "Write docs"]);
/// assert!(parse_action_items("No list here").is_none());
/// ```
pub fn parse_action_items(response: &str) -> Option<Vec<String>> {
    let trimmed = response.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed)
        && let Some(items) = list_from_value(&value)
    {
        return Some(items);
    }

    if let Some(object) = slice_between(trimmed, '{', '}')
        && let Ok(value) = serde_json::from_str::<Value>(object)
        && let Some(items) = list_from_value(&value)
    {
        return Some(items);
    }

    if let Some(array) = slice_between(trimmed, '[', ']')
        && let Ok(value) = serde_json::from_str::<Value>(array)
    {
        return list_from_value(&value);
    }

    None
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn list_from_value(value: &Value) -> Option<Vec<String>> {
    let array = match value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("action_items")
            .or_else(|| map.get("actionItems"))
            .and_then(Value::as_array)?,
        _ => return None,
    };

    Some(
        array
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(MAX_ACTION_ITEMS)
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array() {
        let items = parse_action_items(r#"["Draft the RFC", "Book a review", "Ship v1"]"#).unwrap();
        assert_eq!(items, vec!["Draft the RFC", "Book a review", "Ship v1"]);
    }

    #[test]
    fn test_fenced_array_with_prose() {
        let response = r#"
Here are the action items:
```json
["Draft the RFC", "Book a review", "Ship v1"]
```
Good luck!
"#;
        assert_eq!(parse_action_items(response).unwrap().len(), 3);
    }

    #[test]
    fn test_object_shapes() {
        let snake = parse_action_items(r#"{"action_items": ["a", "b", "c"]}"#).unwrap();
        assert_eq!(snake, vec!["a", "b", "c"]);

        let camel = parse_action_items(r#"Result: {"actionItems": ["x", "y", "z"]}"#).unwrap();
        assert_eq!(camel, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_caps_at_five_and_drops_blanks() {
        let items =
            parse_action_items(r#"["1", " ", "2", "3", "4", "5", "6", 7, null]"#).unwrap();
        assert_eq!(items, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_unparseable_returns_none() {
        assert!(parse_action_items("").is_none());
        assert!(parse_action_items("1. Do this\n2. Do that").is_none());
        assert!(parse_action_items("[not json").is_none());
        assert!(parse_action_items(r#"{"summary": "no list"}"#).is_none());
        assert!(parse_action_items(r#""just a string""#).is_none());
    }

    #[test]
    fn test_short_list_is_kept() {
        assert_eq!(parse_action_items(r#"["Only one"]"#), Some(vec!["Only one".to_string()]));
        assert_eq!(parse_action_items(r#"["a", "b"]"#).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_array_is_a_list() {
        assert_eq!(parse_action_items("[]"), Some(vec![]));
    }
}
