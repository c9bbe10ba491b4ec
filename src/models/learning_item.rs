//! A vocabulary item: a word and its definition. Only text is stored.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningItem {
    pub id: i64,
    pub word: String,
    pub definition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_json_shape() {
        let item = LearningItem {
            id: 7,
            word: "ephemeral".to_string(),
            definition: "lasting a very short time".to_string(),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["word"], "ephemeral");
        assert_eq!(json["definition"], "lasting a very short time");
    }
}
