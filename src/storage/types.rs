use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoboardError;

/// A named chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// User-visible title
    pub title: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
}

/// One stored (user, assistant) exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier for the exchange
    pub id: String,
    /// Owning conversation
    pub conversation_id: String,
    /// Text the user sent
    pub user_message: String,
    /// Text the assistant replied
    pub assistant_message: String,
    /// When the exchange was stored
    pub timestamp: DateTime<Utc>,
}

/// Rolling summary of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Owning conversation
    pub conversation_id: String,
    /// Condensed free-text summary
    pub summary_text: String,
    /// Number of messages the summary was computed from
    pub message_count: usize,
    /// When the summary was last written
    pub updated_at: DateTime<Utc>,
}

/// One of the four fixed meta-analysis categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// The most important concepts or themes
    #[serde(rename = "kernideen")]
    CoreIdea,
    /// Conclusions reached in the conversation
    #[serde(rename = "erkenntnisse")]
    Insight,
    /// Questions that remain unanswered
    #[serde(rename = "offene_fragen")]
    OpenQuestion,
    /// Concrete tasks that were identified
    #[serde(rename = "todos")]
    Todo,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 4] = [
        Category::CoreIdea,
        Category::Insight,
        Category::OpenQuestion,
        Category::Todo,
    ];

    /// Key used in analysis JSON objects
    pub fn key(self) -> &'static str {
        match self {
            Self::CoreIdea => "kernideen",
            Self::Insight => "erkenntnisse",
            Self::OpenQuestion => "offene_fragen",
            Self::Todo => "todos",
        }
    }

    /// Value stored in the `meta_points.type` column
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::CoreIdea => "core_idea",
            Self::Insight => "insight",
            Self::OpenQuestion => "open_question",
            Self::Todo => "todo",
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Self::CoreIdea => "Kernideen",
            Self::Insight => "Erkenntnisse",
            Self::OpenQuestion => "Offene Fragen",
            Self::Todo => "To-dos",
        }
    }

    /// Extraction instruction used in the analysis prompt
    pub fn instruction(self) -> &'static str {
        match self {
            Self::CoreIdea => "Die wichtigsten Konzepte oder Themen",
            Self::Insight => "Wichtige Erkenntnisse oder Schlussfolgerungen",
            Self::OpenQuestion => "Fragen, die noch nicht beantwortet wurden",
            Self::Todo => "Konkrete Aufgaben oder Aktionen, die identifiziert wurden",
        }
    }

    /// Item returned in place of real points when the model output is unusable
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::CoreIdea => "Analyse wird verarbeitet...",
            Self::Insight => "Erkenntnisse werden extrahiert...",
            Self::OpenQuestion => "Fragen werden identifiziert...",
            Self::Todo => "Aufgaben werden erfasst...",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = CoboardError;

    /// Accepts the JSON key, the stored value, or the hyphenated name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kernideen" | "core_idea" | "core-idea" => Ok(Self::CoreIdea),
            "erkenntnisse" | "insight" => Ok(Self::Insight),
            "offene_fragen" | "open_question" | "open-question" => Ok(Self::OpenQuestion),
            "todos" | "todo" => Ok(Self::Todo),
            other => Err(CoboardError::Validation(format!(
                "Unknown category: {}",
                other
            ))),
        }
    }
}

/// One extracted point belonging to exactly one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaPoint {
    /// Unique identifier for the point
    pub id: String,
    /// Owning conversation
    pub conversation_id: String,
    /// Category the point belongs to
    #[serde(rename = "type")]
    pub category: Category,
    /// Point text
    pub text: String,
    /// Hidden points are excluded from the active view
    pub hidden: bool,
    /// When the point was extracted
    pub created_at: DateTime<Utc>,
}

/// The four category lists of a meta-analysis
///
/// Every list is always present in JSON, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Core ideas
    #[serde(rename = "kernideen", default)]
    pub core_ideas: Vec<String>,
    /// Insights
    #[serde(rename = "erkenntnisse", default)]
    pub insights: Vec<String>,
    /// Open questions
    #[serde(rename = "offene_fragen", default)]
    pub open_questions: Vec<String>,
    /// To-dos
    #[serde(rename = "todos", default)]
    pub todos: Vec<String>,
}

impl Analysis {
    /// Items of one category
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::CoreIdea => &self.core_ideas,
            Category::Insight => &self.insights,
            Category::OpenQuestion => &self.open_questions,
            Category::Todo => &self.todos,
        }
    }

    /// Replace the items of one category
    pub fn set(&mut self, category: Category, items: Vec<String>) {
        match category {
            Category::CoreIdea => self.core_ideas = items,
            Category::Insight => self.insights = items,
            Category::OpenQuestion => self.open_questions = items,
            Category::Todo => self.todos = items,
        }
    }

    /// Group point texts by category, preserving the given order
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a MetaPoint>) -> Self {
        let mut analysis = Self::default();
        for point in points {
            match point.category {
                Category::CoreIdea => analysis.core_ideas.push(point.text.clone()),
                Category::Insight => analysis.insights.push(point.text.clone()),
                Category::OpenQuestion => analysis.open_questions.push(point.text.clone()),
                Category::Todo => analysis.todos.push(point.text.clone()),
            }
        }
        analysis
    }

    /// True when all four lists are empty
    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_accepts_all_spellings() {
        assert_eq!("kernideen".parse::<Category>().unwrap(), Category::CoreIdea);
        assert_eq!("core-idea".parse::<Category>().unwrap(), Category::CoreIdea);
        assert_eq!("insight".parse::<Category>().unwrap(), Category::Insight);
        assert_eq!(
            "Open-Question".parse::<Category>().unwrap(),
            Category::OpenQuestion
        );
        assert_eq!("todo".parse::<Category>().unwrap(), Category::Todo);
        assert!("ideas".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_db_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_db_str().parse::<Category>().unwrap(), category);
            assert_eq!(category.key().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_empty_analysis_serializes_four_arrays() {
        let json = serde_json::to_value(Analysis::default()).unwrap();
        for category in Category::ALL {
            assert!(json[category.key()].is_array(), "{} missing", category);
        }
    }

    #[test]
    fn test_analysis_set_and_get() {
        let mut analysis = Analysis::default();
        analysis.set(Category::Todo, vec!["Bericht schreiben".to_string()]);
        assert_eq!(analysis.get(Category::Todo), ["Bericht schreiben"]);
        assert!(analysis.get(Category::Insight).is_empty());
        assert!(!analysis.is_empty());
    }

    #[test]
    fn test_meta_point_serializes_category_as_type() {
        let point = MetaPoint {
            id: "p1".to_string(),
            conversation_id: "c1".to_string(),
            category: Category::OpenQuestion,
            text: "Wann?".to_string(),
            hidden: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["type"], "offene_fragen");
    }
}
