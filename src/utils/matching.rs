//! Name normalization and fuzzy text matching shared by the strategies.

/// Lower-cased name with everything except ASCII letters and digits removed.
pub(crate) fn alphanumeric_lower(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Lower-cased whitespace-separated words longer than one character.
pub(crate) fn company_words(name: &str) -> Vec<String> {
    name.split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Words long enough (more than two characters) to count as evidence on their own.
pub(crate) fn significant_words(name: &str) -> Vec<String> {
    company_words(name)
        .into_iter()
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// First character of each word.
pub(crate) fn acronym(words: &[String]) -> String {
    words.iter().filter_map(|w| w.chars().next()).collect()
}

/// True when `text` mentions the full company name or one of its significant words.
/// Case-insensitive substring matching.
pub(crate) fn text_mentions_company(text: &str, company_name: &str) -> bool {
    let text_lower = text.to_lowercase();
    let name_lower = company_name.trim().to_lowercase();
    if !name_lower.is_empty() && text_lower.contains(&name_lower) {
        return true;
    }
    significant_words(company_name)
        .iter()
        .any(|word| text_lower.contains(word.as_str()))
}

/// Page-title acceptance for the domain probe: [`text_mentions_company`], or the
/// title with whitespace removed contains the alphanumeric form of the name.
pub(crate) fn title_matches_company(title: &str, company_name: &str) -> bool {
    if text_mentions_company(title, company_name) {
        return true;
    }
    let clean = alphanumeric_lower(company_name);
    if clean.is_empty() {
        return false;
    }
    let squashed: String = title
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    squashed.contains(&clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_names() {
        assert_eq!(alphanumeric_lower("AT&T Inc."), "attinc");
        assert_eq!(company_words("  Acme   Robotics  X "), vec!["acme", "robotics"]);
        assert_eq!(significant_words("GE of NY Holdings"), vec!["holdings"]);
        assert_eq!(acronym(&company_words("Acme Robotics")), "ar");
    }

    #[test]
    fn title_matches_full_name_or_words() {
        assert!(title_matches_company("Tesla | Electric Cars", "Tesla"));
        assert!(title_matches_company("Welcome to ACME", "Acme Robotics"));
        assert!(!title_matches_company("Domain for sale", "Acme Robotics"));
    }

    #[test]
    fn title_matches_squashed_form() {
        assert!(title_matches_company("OpenAI", "Op En"));
        assert!(!text_mentions_company("OpenAI", "Op En"));
        assert!(title_matches_company("Op En Labs", "Op-En"));
    }

    #[test]
    fn short_words_do_not_count() {
        assert!(!text_mentions_company("The go-to store", "Go Co"));
    }
}
