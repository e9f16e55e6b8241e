use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const LINE_KEY_PREFIX: &str = "line ";

/// Body text of a news article, one entry per non-empty paragraph line.
///
/// Serializes as an ordered JSON object `{"line 1": .., "line 2": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineContent(Vec<String>);

impl LineContent {
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns line `number`, counted from 1.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.0.get(idx))
            .map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }
}

impl Serialize for LineContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (idx, line) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("{LINE_KEY_PREFIX}{}", idx + 1), line)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LineContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LineContentVisitor)
    }
}

struct LineContentVisitor;

impl<'de> Visitor<'de> for LineContentVisitor {
    type Value = LineContent;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map of \"line N\" keys to text")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut numbered: Vec<(usize, String)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            let number = key
                .strip_prefix(LINE_KEY_PREFIX)
                .and_then(|n| n.trim().parse::<usize>().ok())
                .ok_or_else(|| de::Error::custom(format!("unexpected line key {key:?}")))?;
            numbered.push((number, value));
        }
        numbered.sort_by_key(|(number, _)| *number);
        Ok(LineContent(numbered.into_iter().map(|(_, text)| text).collect()))
    }
}

/// One parsed news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub url: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub line_count: usize,
    pub line_content: LineContent,
}

impl NewsRecord {
    /// Builds a record whose `line_count` always matches its body lines.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        date: impl Into<String>,
        lines: Vec<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            author: author.into(),
            date: date.into(),
            line_count: lines.len(),
            line_content: LineContent::new(lines),
        }
    }
}

/// Case number cell of a court results table: display text plus detail link.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaseNumber {
    pub text: String,
    pub link: String,
}

/// One row of a court-portal results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtCaseRecord {
    pub court: String,
    pub case_number: CaseNumber,
    pub case_title: String,
    pub classification: String,
    pub filed_date: String,
    pub status: String,
}

/// A record produced by an extraction strategy.
///
/// Untagged so each variant keeps its own JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedRecord {
    News(NewsRecord),
    CourtCase(CourtCaseRecord),
}

impl ParsedRecord {
    pub fn as_news(&self) -> Option<&NewsRecord> {
        match self {
            ParsedRecord::News(record) => Some(record),
            ParsedRecord::CourtCase(_) => None,
        }
    }

    pub fn as_court_case(&self) -> Option<&CourtCaseRecord> {
        match self {
            ParsedRecord::CourtCase(record) => Some(record),
            ParsedRecord::News(_) => None,
        }
    }
}

impl From<NewsRecord> for ParsedRecord {
    fn from(record: NewsRecord) -> Self {
        ParsedRecord::News(record)
    }
}

impl From<CourtCaseRecord> for ParsedRecord {
    fn from(record: CourtCaseRecord) -> Self {
        ParsedRecord::CourtCase(record)
    }
}

/// Ordered records of a run; serialized as a single JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<ParsedRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ParsedRecord) {
        self.records.push(record);
    }

    pub fn append(&mut self, other: ResultSet) {
        self.records.extend(other.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ParsedRecord] {
        &self.records
    }

    pub fn first(&self) -> Option<&ParsedRecord> {
        self.records.first()
    }

    /// Pretty-printed JSON array; non-ASCII text is kept as-is.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Vec<ParsedRecord>> for ResultSet {
    fn from(records: Vec<ParsedRecord>) -> Self {
        Self { records }
    }
}

impl Extend<ParsedRecord> for ResultSet {
    fn extend<I: IntoIterator<Item = ParsedRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl IntoIterator for ResultSet {
    type Item = ParsedRecord;
    type IntoIter = std::vec::IntoIter<ParsedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{LineContent, NewsRecord};

    #[test]
    fn line_numbers_start_at_one() {
        let content = LineContent::new(vec!["a".into(), "b".into()]);
        assert_eq!(content.line(0), None);
        assert_eq!(content.line(1), Some("a"));
        assert_eq!(content.line(2), Some("b"));
        assert_eq!(content.line(3), None);
    }

    #[test]
    fn line_count_tracks_lines() {
        let record = NewsRecord::new("u", "t", "a", "d", vec!["x".into()]);
        assert_eq!(record.line_count, 1);
        assert_eq!(record.line_content.len(), 1);
    }

    #[test]
    fn rejects_unknown_line_keys() {
        let err = serde_json::from_str::<LineContent>(r#"{"paragraph": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("unexpected line key"));
    }
}
