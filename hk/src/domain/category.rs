//! Sentence categories
//!
//! The hitokoto corpus is split into twelve fixed categories, each
//! identified by a single lowercase letter from `a` to `l`.

use serde::{Deserialize, Serialize};

/// Category of a sentence, serialized as its single-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "a")]
    Anime,
    #[serde(rename = "b")]
    Comic,
    #[serde(rename = "c")]
    Game,
    #[serde(rename = "d")]
    Literature,
    #[serde(rename = "e")]
    Original,
    #[serde(rename = "f")]
    Internet,
    #[serde(rename = "g")]
    Other,
    #[serde(rename = "h")]
    Film,
    #[serde(rename = "i")]
    Poetry,
    #[serde(rename = "j")]
    NeteaseMusic,
    #[serde(rename = "k")]
    Philosophy,
    #[serde(rename = "l")]
    Witticism,
}

impl Category {
    /// Every category in code order
    pub const ALL: [Category; 12] = [
        Self::Anime,
        Self::Comic,
        Self::Game,
        Self::Literature,
        Self::Original,
        Self::Internet,
        Self::Other,
        Self::Film,
        Self::Poetry,
        Self::NeteaseMusic,
        Self::Philosophy,
        Self::Witticism,
    ];

    /// Single-letter code used by the API and the bundle files
    pub fn code(self) -> char {
        match self {
            Self::Anime => 'a',
            Self::Comic => 'b',
            Self::Game => 'c',
            Self::Literature => 'd',
            Self::Original => 'e',
            Self::Internet => 'f',
            Self::Other => 'g',
            Self::Film => 'h',
            Self::Poetry => 'i',
            Self::NeteaseMusic => 'j',
            Self::Philosophy => 'k',
            Self::Witticism => 'l',
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Anime => "Anime",
            Self::Comic => "Comic",
            Self::Game => "Game",
            Self::Literature => "Literature",
            Self::Original => "Original",
            Self::Internet => "Internet",
            Self::Other => "Other",
            Self::Film => "Film & TV",
            Self::Poetry => "Poetry",
            Self::NeteaseMusic => "NetEase Cloud Music",
            Self::Philosophy => "Philosophy",
            Self::Witticism => "Witticism",
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => {
                Self::from_code(code.to_ascii_lowercase()).ok_or_else(|| format!("Unknown category: {}", s))
            }
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Parse a category list such as `"a"`, `"adk"` or `"a,d,k"`
///
/// Duplicates are dropped, order of first appearance is kept. Any letter
/// outside `a`..=`l` rejects the whole list.
pub fn parse_categories(s: &str) -> Result<Vec<Category>, String> {
    let mut categories = Vec::new();
    for ch in s.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        let category = Category::from_code(ch.to_ascii_lowercase())
            .ok_or_else(|| format!("Unknown category '{}', expected one of a-l", ch))?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    if categories.is_empty() {
        return Err("At least one category letter (a-l) is required".to_string());
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_a_to_l() {
        let codes: String = Category::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes, "abcdefghijkl");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("a".parse::<Category>().unwrap(), Category::Anime);
        assert_eq!("L".parse::<Category>().unwrap(), Category::Witticism);
        assert!("m".parse::<Category>().is_err());
        assert!("ab".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&Category::Literature).unwrap();
        assert_eq!(json, "\"d\"");

        let category: Category = serde_json::from_str("\"k\"").unwrap();
        assert_eq!(category, Category::Philosophy);

        assert!(serde_json::from_str::<Category>("\"z\"").is_err());
    }

    #[test]
    fn test_parse_categories() {
        assert_eq!(parse_categories("a").unwrap(), vec![Category::Anime]);
        assert_eq!(
            parse_categories("d, a,d").unwrap(),
            vec![Category::Literature, Category::Anime]
        );
        assert!(parse_categories("ax").is_err());
        assert!(parse_categories(" , ").is_err());
    }
}
