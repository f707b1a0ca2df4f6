use super::{SharedState, StateSnapshot, StateValue};

/// Read access used while resolving placeholders.
///
/// Implemented by the live store and by pinned snapshots so an agent can be
/// resolved against whichever view its invocation was given.
pub trait StateView {
    fn lookup(&self, key: &str) -> Option<StateValue>;
}

impl StateView for SharedState {
    fn lookup(&self, key: &str) -> Option<StateValue> {
        self.get(key)
    }
}

impl StateView for StateSnapshot {
    fn lookup(&self, key: &str) -> Option<StateValue> {
        self.get(key).cloned()
    }
}

/// Substitute `{ KEY? }`, `{KEY?}` and `{KEY}` placeholders from `view`.
///
/// Unset keys render as the empty string. Brace groups that are not a bare
/// identifier (JSON snippets, prose) are copied through unchanged.
pub fn render_template(template: &str, view: &dyn StateView) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) => match placeholder_key(&after[..close]) {
                Some(key) => {
                    if let Some(value) = view.lookup(key) {
                        out.push_str(&value.render());
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn placeholder_key(inner: &str) -> Option<&str> {
    let trimmed = inner.trim();
    let key = trimmed.strip_suffix('?').unwrap_or(trimmed).trim_end();

    let mut chars = key.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(key)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TOPIC_KEY;

    #[test]
    fn test_unset_key_renders_empty() {
        let state = SharedState::new();
        assert_eq!(render_template("Topic: { TOPIC? }.", &state), "Topic: .");
    }

    #[test]
    fn test_placeholder_forms() {
        let state = SharedState::new();
        state.set(TOPIC_KEY, "Nikola Tesla").unwrap();

        for template in ["{ TOPIC? }", "{TOPIC?}", "{TOPIC}", "{ TOPIC }"] {
            assert_eq!(render_template(template, &state), "Nikola Tesla");
        }
    }

    #[test]
    fn test_list_renders_as_lines() {
        let state = SharedState::new();
        state.append("pos_data", "AC induction motor").unwrap();
        state.append("pos_data", "Radio patents").unwrap();

        assert_eq!(
            render_template("Evidence:\n{ pos_data? }", &state),
            "Evidence:\n- AC induction motor\n- Radio patents"
        );
    }

    #[test]
    fn test_non_placeholder_braces_untouched() {
        let state = SharedState::new();
        let template = r#"Call with {"field": "pos_data"} then { not a key } and {"#;
        assert_eq!(render_template(template, &state), template);
    }

    #[test]
    fn test_nested_brace_then_placeholder() {
        let state = SharedState::new();
        state.set(TOPIC_KEY, "Ada").unwrap();
        assert_eq!(render_template("{{TOPIC}}", &state), "{Ada}");
    }

    #[test]
    fn test_snapshot_view() {
        let state = SharedState::new();
        state.set(TOPIC_KEY, "Ada").unwrap();
        let snapshot = state.snapshot();
        state.append("pos_data", "late").unwrap();

        assert_eq!(render_template("{TOPIC}|{pos_data?}", &snapshot), "Ada|");
    }
}
