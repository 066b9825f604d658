//! Content outline being edited for one session
//!
//! Axes are keyed by their text. Two axes with the same text share an
//! identity, so a reorder naming that text always moves the first of them.

use slidecast_common::models::{ContentRequest, Session, SessionUpdate, DEFAULT_LANGUAGE};
use slidecast_common::Level;

/// Message reported when the outline is not ready for generation
pub const INCOMPLETE_DRAFT_MESSAGE: &str = "Please select a topic and at least one axis";

/// In-progress, unpersisted content outline
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDraft {
    pub language: String,
    pub topic: String,
    pub level: Level,
    axes: Vec<String>,
}

impl ContentDraft {
    /// Seed a draft from a selected session
    ///
    /// Stored values win; the course title stands in for a missing topic,
    /// and language/level/axes fall back to "en", beginner and empty.
    pub fn seed(session: &Session, course_title: Option<&str>) -> Self {
        let language = session
            .language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();

        let topic = session
            .topic
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(course_title)
            .unwrap_or_default()
            .to_string();

        Self {
            language,
            topic,
            level: session.level.unwrap_or_default(),
            axes: session.axes.clone().unwrap_or_default(),
        }
    }

    pub fn axes(&self) -> &[String] {
        &self.axes
    }

    /// Append an axis; blank input is ignored
    ///
    /// Returns true if the axis was appended.
    pub fn add_axis(&mut self, axis: &str) -> bool {
        let axis = axis.trim();
        if axis.is_empty() {
            return false;
        }
        self.axes.push(axis.to_string());
        true
    }

    /// Move the axis `from` to the position currently held by `to`
    ///
    /// Returns true if the order changed.
    pub fn reorder_axes(&mut self, from: &str, to: &str) -> bool {
        let reordered = reorder(&self.axes, &from.to_string(), &to.to_string());
        let changed = reordered != self.axes;
        self.axes = reordered;
        changed
    }

    /// Generation requires a topic and at least one axis
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.topic.trim().is_empty() || self.axes.is_empty() {
            return Err(INCOMPLETE_DRAFT_MESSAGE);
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Payload for the generation trigger
    pub fn to_request(&self) -> ContentRequest {
        ContentRequest {
            language: self.language.clone(),
            topic: self.topic.clone(),
            level: self.level,
            axes: self.axes.clone(),
        }
    }

    /// Session update carrying the outline fields
    pub fn to_session_update(&self) -> SessionUpdate {
        SessionUpdate {
            language: Some(self.language.clone()),
            topic: Some(self.topic.clone()),
            level: Some(self.level),
            axes: Some(self.axes.clone()),
            ..Default::default()
        }
    }
}

impl Default for ContentDraft {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            topic: String::new(),
            level: Level::default(),
            axes: Vec::new(),
        }
    }
}

/// Reorder by value equality; see [`reorder_by`]
pub fn reorder<T: Clone + PartialEq>(items: &[T], from: &T, to: &T) -> Vec<T> {
    reorder_by(items, from, to, |item| item.clone())
}

/// Move the element identified by `from` into the position of the element
/// identified by `to`, shifting the elements in between by one
///
/// Identity is the first element whose key equals the given key. Returns an
/// unchanged copy when either key is absent or both resolve to the same
/// position. Elements outside the moved range keep their positions.
pub fn reorder_by<T, K, F>(items: &[T], from: &K, to: &K, key: F) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut result = items.to_vec();

    let from_index = items.iter().position(|item| key(item) == *from);
    let to_index = items.iter().position(|item| key(item) == *to);

    let (Some(from_index), Some(to_index)) = (from_index, to_index) else {
        return result;
    };
    if from_index == to_index {
        return result;
    }

    let moved = result.remove(from_index);
    result.insert(to_index, moved);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecast_common::SessionStatus;

    fn session() -> Session {
        Session {
            id: 1,
            course_id: 10,
            teacher_id: 5,
            group_ids: vec![2],
            start_date: None,
            status: SessionStatus::Pending,
            language: None,
            topic: None,
            level: None,
            axes: None,
            content_generated: false,
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_seed_defaults() {
        let draft = ContentDraft::seed(&session(), None);
        assert_eq!(draft.language, "en");
        assert_eq!(draft.topic, "");
        assert_eq!(draft.level, Level::Beginner);
        assert!(draft.axes().is_empty());
    }

    #[test]
    fn test_seed_uses_course_title_without_stored_topic() {
        let draft = ContentDraft::seed(&session(), Some("Java Fundamentals"));
        assert_eq!(draft.topic, "Java Fundamentals");
    }

    #[test]
    fn test_seed_prefers_stored_fields() {
        let mut s = session();
        s.language = Some("fr".to_string());
        s.topic = Some("Streams".to_string());
        s.level = Some(Level::Advanced);
        s.axes = Some(strings(&["Collectors", "Parallelism"]));

        let draft = ContentDraft::seed(&s, Some("Java Fundamentals"));
        assert_eq!(draft.language, "fr");
        assert_eq!(draft.topic, "Streams");
        assert_eq!(draft.level, Level::Advanced);
        assert_eq!(draft.axes(), strings(&["Collectors", "Parallelism"]).as_slice());
    }

    #[test]
    fn test_validate_requires_topic_and_axis() {
        let mut draft = ContentDraft::default();
        assert_eq!(draft.validate(), Err(INCOMPLETE_DRAFT_MESSAGE));

        draft.topic = "Rust".to_string();
        assert!(!draft.is_complete());

        assert!(draft.add_axis("Ownership"));
        assert!(draft.is_complete());

        draft.topic = "   ".to_string();
        assert!(!draft.is_complete());
    }

    #[test]
    fn test_add_axis_trims_and_ignores_blank() {
        let mut draft = ContentDraft::default();
        assert!(!draft.add_axis("   "));
        assert!(draft.add_axis("  Traits "));
        assert_eq!(draft.axes(), strings(&["Traits"]).as_slice());
    }

    #[test]
    fn test_reorder_moves_forward_and_back() {
        let axes = strings(&["a", "b", "c", "d"]);

        let forward = reorder(&axes, &"a".to_string(), &"c".to_string());
        assert_eq!(forward, strings(&["b", "c", "a", "d"]));

        let back = reorder(&axes, &"d".to_string(), &"b".to_string());
        assert_eq!(back, strings(&["a", "d", "b", "c"]));
    }

    #[test]
    fn test_reorder_noop_cases() {
        let axes = strings(&["a", "b", "c"]);

        assert_eq!(reorder(&axes, &"b".to_string(), &"b".to_string()), axes);
        assert_eq!(reorder(&axes, &"x".to_string(), &"b".to_string()), axes);
        assert_eq!(reorder(&axes, &"a".to_string(), &"x".to_string()), axes);
    }

    #[test]
    fn test_reorder_preserves_multiset_for_every_pair() {
        let axes = strings(&["a", "b", "c", "d", "e"]);
        let mut sorted_input = axes.clone();
        sorted_input.sort();

        for from in &axes {
            for to in &axes {
                let mut result = reorder(&axes, from, to);
                assert_eq!(result.len(), axes.len());

                // Elements outside the moved range stay put
                let from_index = axes.iter().position(|a| a == from).unwrap();
                let to_index = axes.iter().position(|a| a == to).unwrap();
                let (lo, hi) = (from_index.min(to_index), from_index.max(to_index));
                for i in (0..lo).chain(hi + 1..axes.len()) {
                    assert_eq!(result[i], axes[i]);
                }

                result.sort();
                assert_eq!(result, sorted_input);
            }
        }
    }

    #[test]
    fn test_reorder_is_deterministic() {
        let axes = strings(&["a", "b", "c", "d"]);
        let first = reorder(&axes, &"b".to_string(), &"d".to_string());
        let second = reorder(&axes, &"b".to_string(), &"d".to_string());
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_axes_resolve_to_first_occurrence() {
        let mut draft = ContentDraft::default();
        draft.add_axis("intro");
        draft.add_axis("loops");
        draft.add_axis("intro");

        assert!(draft.reorder_axes("intro", "loops"));
        assert_eq!(draft.axes(), strings(&["loops", "intro", "intro"]).as_slice());
    }

    #[test]
    fn test_reorder_by_custom_identity() {
        let items = vec![(1, "one"), (2, "two"), (3, "three")];
        let result = reorder_by(&items, &3, &1, |item| item.0);
        assert_eq!(result, vec![(3, "three"), (1, "one"), (2, "two")]);
    }
}
