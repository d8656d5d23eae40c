use crate::error::CoreError;
use serde::Deserialize;

/// Raw search input as submitted by the customer search form.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchTerm {
    pub search: String,
}

impl SearchTerm {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
        }
    }
}

/// A first/last name pair normalised for an exact lookup.
///
/// The first whitespace-separated token is the first name; every remaining
/// token belongs to the last name, so "anna van der berg" becomes
/// ("Anna", "Van Der Berg"). Only the leading character of each token is
/// upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameQuery {
    pub first_name: String,
    pub last_name: String,
}

impl NameQuery {
    pub fn parse(term: &str) -> Result<Self, CoreError> {
        let mut tokens = term.split_whitespace().map(capitalize_first);

        let first_name = tokens
            .next()
            .ok_or_else(|| CoreError::invalid_input("search", "expected a first and last name"))?;

        let last_name = tokens.collect::<Vec<_>>().join(" ");
        if last_name.is_empty() {
            return Err(CoreError::invalid_input(
                "search",
                format!("expected a last name after '{first_name}'"),
            ));
        }

        Ok(Self {
            first_name,
            last_name,
        })
    }
}

impl TryFrom<&SearchTerm> for NameQuery {
    type Error = CoreError;

    fn try_from(term: &SearchTerm) -> Result<Self, Self::Error> {
        Self::parse(&term.search)
    }
}

/// Upper-cases the first character of `word` and leaves the rest untouched.
pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_both_names() {
        let query = NameQuery::parse("jane doe").unwrap();
        assert_eq!(query.first_name, "Jane");
        assert_eq!(query.last_name, "Doe");
    }

    #[test]
    fn leaves_the_rest_of_each_token_alone() {
        let query = NameQuery::parse("mcKENZIE o'neil").unwrap();
        assert_eq!(query.first_name, "McKENZIE");
        assert_eq!(query.last_name, "O'neil");
    }

    #[test]
    fn ignores_extra_whitespace() {
        let query = NameQuery::parse("  jane   doe ").unwrap();
        assert_eq!(query.first_name, "Jane");
        assert_eq!(query.last_name, "Doe");
    }

    #[test]
    fn joins_multi_word_last_names() {
        let query = NameQuery::parse("anna van der berg").unwrap();
        assert_eq!(query.first_name, "Anna");
        assert_eq!(query.last_name, "Van Der Berg");
    }

    #[test]
    fn single_token_is_rejected() {
        let err = NameQuery::parse("janedoe").unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "search"));
    }

    #[test]
    fn blank_term_is_rejected() {
        assert!(NameQuery::parse("   ").is_err());
        assert!(NameQuery::parse("").is_err());
    }

    #[test]
    fn capitalizes_non_ascii_initials() {
        assert_eq!(capitalize_first("élodie"), "Élodie");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn converts_from_search_term() {
        let term = SearchTerm::new("ann lee");
        let query = NameQuery::try_from(&term).unwrap();
        assert_eq!(query.first_name, "Ann");
    }
}
