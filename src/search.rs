use crate::store::{ListingFilter, SortOrder, TextField};

/// Text fields tried in priority order, with the ordering of their results
const TEXT_STEPS: [(TextField, SortOrder); 4] = [
    (TextField::Title, SortOrder::Insertion),
    (TextField::Category, SortOrder::NewestFirst),
    (TextField::Country, SortOrder::NewestFirst),
    (TextField::Location, SortOrder::NewestFirst),
];

/// One query of the search plan and the notice shown when it matches
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStep {
    pub filter: ListingFilter,
    pub order: SortOrder,
    pub notice: String,
}

/// Trim, collapse inner whitespace and title-case every word.
///
/// Returns `None` for a blank query.
pub fn normalize_query(raw: &str) -> Option<String> {
    let words: Vec<String> = raw.split_whitespace().map(title_case).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Integer at the start of `term` (`"500"`, `"500 Rs"`, `"-3"`), like a lenient `parseInt`.
///
/// Values beyond `i64` saturate.
pub fn leading_integer(term: &str) -> Option<i64> {
    let term = term.trim_start();
    let (sign, digits) = match term.as_bytes().first() {
        Some(b'-') => (-1, &term[1..]),
        Some(b'+') => (1, &term[1..]),
        _ => (1, term),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    Some(match digits[..end].parse::<i64>() {
        Ok(value) => sign * value,
        Err(_) if sign < 0 => i64::MIN,
        Err(_) => i64::MAX,
    })
}

/// Queries to run for a normalized search term; the first non-empty result wins
pub fn search_plan(term: &str) -> Vec<SearchStep> {
    let mut plan: Vec<SearchStep> = TEXT_STEPS
        .iter()
        .map(|&(field, order)| SearchStep {
            filter: ListingFilter::Contains {
                field,
                needle: term.to_string(),
            },
            order,
            notice: format!("Listings searched by {}!", field.label()),
        })
        .collect();

    if let Some(limit) = leading_integer(term) {
        plan.push(SearchStep {
            filter: ListingFilter::PriceAtMost(limit),
            order: SortOrder::PriceAscending,
            notice: format!("Listings searched by price less than Rs {}!", term),
        });
    }
    plan
}
