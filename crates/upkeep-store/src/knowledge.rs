//! Knowledge-base collection: saved question/answer pairs, newest first.

use uuid::Uuid;

use upkeep_core::KnowledgeBaseItem;

/// Prepend a freshly answered item.
pub fn prepend_item(
    items: &[KnowledgeBaseItem],
    item: KnowledgeBaseItem,
) -> Vec<KnowledgeBaseItem> {
    let mut updated = Vec::with_capacity(items.len() + 1);
    updated.push(item);
    updated.extend_from_slice(items);
    updated
}

/// Drop the item with `id`.
pub fn remove_item(items: &[KnowledgeBaseItem], id: Uuid) -> Vec<KnowledgeBaseItem> {
    items.iter().filter(|i| i.id != id).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(question: &str) -> KnowledgeBaseItem {
        KnowledgeBaseItem {
            id: Uuid::new_v4(),
            question: question.to_string(),
            answer: "Use a descaler.".to_string(),
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_prepend_is_newest_first() {
        let items = prepend_item(&[], item("first"));
        let items = prepend_item(&items, item("second"));

        assert_eq!(items[0].question, "second");
        assert_eq!(items[1].question, "first");
    }

    #[test]
    fn test_remove_item() {
        let keep = item("keep");
        let drop = item("drop");
        let drop_id = drop.id;

        let items = vec![keep, drop];
        let items = remove_item(&items, drop_id);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, "keep");
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let items = vec![item("a")];
        let updated = remove_item(&items, Uuid::new_v4());
        assert_eq!(updated, items);
    }
}
