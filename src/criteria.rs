use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::models::JobType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Match,
    Newest,
    Salary,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::Match => SortKey::Newest,
            SortKey::Newest => SortKey::Salary,
            SortKey::Salary => SortKey::Match,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Match => "Best match",
            SortKey::Newest => "Newest",
            SortKey::Salary => "Salary",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "match" => Ok(SortKey::Match),
            "newest" => Ok(SortKey::Newest),
            "salary" => Ok(SortKey::Salary),
            other => Err(format!("unknown sort '{}' (expected match, newest, salary)", other)),
        }
    }
}

/// The page-size menu offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PageSize {
    Six,
    #[default]
    Twelve,
    TwentyFour,
}

impl PageSize {
    pub fn get(self) -> usize {
        match self {
            PageSize::Six => 6,
            PageSize::Twelve => 12,
            PageSize::TwentyFour => 24,
        }
    }

    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            6 => Some(PageSize::Six),
            12 => Some(PageSize::Twelve),
            24 => Some(PageSize::TwentyFour),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PageSize::Six => PageSize::Twelve,
            PageSize::Twelve => PageSize::TwentyFour,
            PageSize::TwentyFour => PageSize::Six,
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .ok()
            .and_then(PageSize::from_count)
            .ok_or_else(|| format!("page size must be 6, 12 or 24 (got '{}')", s))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Session-local refinement state. Survives re-acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub query: String,
    pub location: String,
    pub job_type: Option<JobType>,
    pub min_salary: Option<f64>,
    pub sources: BTreeSet<String>,
    pub sort: SortKey,
    pub page_size: PageSize,
    /// 1-based, always clamped against the current filtered count.
    pub page: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            query: String::new(),
            location: String::new(),
            job_type: None,
            min_salary: None,
            sources: BTreeSet::new(),
            sort: SortKey::default(),
            page_size: PageSize::default(),
            page: 1,
        }
    }
}

/// Free-text fields as the user is typing them, before the debounce
/// window commits them into `SearchCriteria`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDraft {
    pub query: String,
    pub location: String,
    pub min_salary: String,
}

impl TextDraft {
    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        Self {
            query: criteria.query.clone(),
            location: criteria.location.clone(),
            min_salary: criteria
                .min_salary
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn commit_into(&self, criteria: &mut SearchCriteria) {
        criteria.query = self.query.clone();
        criteria.location = self.location.clone();
        criteria.min_salary = parse_min_salary(&self.min_salary);
    }
}

/// Empty, zero, negative or non-numeric input means "no minimum".
pub fn parse_min_salary(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_min_salary() {
        assert_eq!(parse_min_salary("800000"), Some(800000.0));
        assert_eq!(parse_min_salary(" 1,200,000 "), Some(1200000.0));
        assert_eq!(parse_min_salary(""), None);
        assert_eq!(parse_min_salary("0"), None);
        assert_eq!(parse_min_salary("lots"), None);
    }

    #[test]
    fn test_page_size_menu() {
        assert_eq!("24".parse::<PageSize>().unwrap(), PageSize::TwentyFour);
        assert!("10".parse::<PageSize>().is_err());
        assert_eq!(PageSize::TwentyFour.next(), PageSize::Six);
        assert_eq!(PageSize::default().get(), 12);
    }

    #[test]
    fn test_draft_round_trip_through_criteria() {
        let mut criteria = SearchCriteria::default();
        let draft = TextDraft {
            query: "engineer".to_string(),
            location: "Bengaluru".to_string(),
            min_salary: "abc".to_string(),
        };
        draft.commit_into(&mut criteria);
        assert_eq!(criteria.query, "engineer");
        assert_eq!(criteria.location, "Bengaluru");
        assert_eq!(criteria.min_salary, None);
        assert_eq!(TextDraft::from_criteria(&criteria).min_salary, "");
    }
}
