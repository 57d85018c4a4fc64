//! Pure rules for turning project data into accounting entity fields.

use crate::domain::project::Task;

/// Provider limit on `Item.Name`.
pub const ITEM_NAME_MAX_CHARS: usize = 100;

const ITEM_NAME_SEPARATOR: &str = " - ";

/// Builds `"<name> - <contract>"`, shortening the contract part to fit.
///
/// When the full name is too long, comma-delimited parts of `contract_name`
/// are packed from the right-most part leftwards until the next one no longer
/// fits. If not even the right-most part fits, only `name` is returned.
pub fn build_item_name(name: &str, contract_name: &str) -> String {
    let full = format!("{}{}{}", name, ITEM_NAME_SEPARATOR, contract_name);
    if full.chars().count() <= ITEM_NAME_MAX_CHARS {
        return full;
    }

    let prefix = format!("{}{}", name, ITEM_NAME_SEPARATOR);
    let budget = ITEM_NAME_MAX_CHARS.saturating_sub(prefix.chars().count());

    let mut suffix = String::new();
    for part in contract_name.split(',').map(str::trim).rev() {
        if part.is_empty() {
            continue;
        }
        let candidate = if suffix.is_empty() {
            part.to_string()
        } else {
            format!("{}, {}", part, suffix)
        };
        if candidate.chars().count() > budget {
            break;
        }
        suffix = candidate;
    }

    if suffix.is_empty() {
        prefix.trim_end_matches(ITEM_NAME_SEPARATOR).to_string()
    } else {
        format!("{}{}", prefix, suffix)
    }
}

/// Item unit price: the sum of task costs.
pub fn item_unit_price(tasks: &[Task]) -> f64 {
    tasks.iter().map(|task| task.cost).sum()
}

/// Item description: `"[1]: first;\n[2]: second"`.
pub fn item_description(tasks: &[Task]) -> String {
    tasks
        .iter()
        .enumerate()
        .map(|(index, task)| format!("[{}]: {}", index + 1, task.name))
        .collect::<Vec<_>>()
        .join(";\n")
}

/// Parts of a `"city, state, zip"` address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostalAddress {
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// Splits on commas into city / state / raw postal part; the postal code is
/// whatever follows the first space of the raw part (the whole raw part when
/// it has no space).
pub fn parse_city_state_zip(address: &str) -> PostalAddress {
    let mut parts = address.split(',');
    let city = parts.next().map(str::trim).filter(|s| !s.is_empty());
    let state = parts.next().map(str::trim).filter(|s| !s.is_empty());
    let postal_code = parts
        .next()
        .map(|raw| match raw.find(' ') {
            Some(index) => &raw[index + 1..],
            None => raw,
        })
        .filter(|s| !s.is_empty());

    PostalAddress {
        city: city.map(str::to_string),
        state: state.map(str::to_string),
        postal_code: postal_code.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_item_name_is_returned_verbatim() {
        assert_eq!(
            build_item_name("Paint Work", "123 Main St, Mountain View, CA 94042"),
            "Paint Work - 123 Main St, Mountain View, CA 94042"
        );
    }

    #[test]
    fn name_of_exactly_max_length_is_kept() {
        let contract = "x".repeat(ITEM_NAME_MAX_CHARS - "Paint - ".len());
        let name = build_item_name("Paint", &contract);
        assert_eq!(name.chars().count(), ITEM_NAME_MAX_CHARS);
        assert!(name.ends_with(&contract));
    }

    #[test]
    fn oversized_contract_drops_left_most_parts_first() {
        let long_building = format!("Building {}", "A".repeat(60));
        let contract = format!("{}, 123 Main St, Mountain View, CA 94042", long_building);

        assert_eq!(
            build_item_name("Paint Work", &contract),
            "Paint Work - 123 Main St, Mountain View, CA 94042"
        );
    }

    #[test]
    fn packing_stops_at_first_part_that_does_not_fit() {
        // 92 chars of budget after "Paint - "; the middle part can never fit
        let contract = format!("short, {}, CA 94042", "M".repeat(95));
        assert_eq!(build_item_name("Paint", &contract), "Paint - CA 94042");
    }

    #[test]
    fn nothing_fits_returns_bare_name() {
        let contract = format!("{}, {}", "a".repeat(60), "b".repeat(120));
        assert_eq!(build_item_name("Paint Work", &contract), "Paint Work");
    }

    #[test]
    fn price_and_description_from_tasks() {
        let tasks = vec![Task::new("paint", 100.0), Task::new("trim", 50.0)];
        assert_eq!(item_unit_price(&tasks), 150.0);
        assert_eq!(item_description(&tasks), "[1]: paint;\n[2]: trim");
    }

    #[test]
    fn empty_task_list_has_zero_price_and_empty_description() {
        assert_eq!(item_unit_price(&[]), 0.0);
        assert_eq!(item_description(&[]), "");
    }

    #[test]
    fn parses_city_state_zip() {
        let address = parse_city_state_zip("Mountain View, CA, 94042");
        assert_eq!(address.city.as_deref(), Some("Mountain View"));
        assert_eq!(address.state.as_deref(), Some("CA"));
        assert_eq!(address.postal_code.as_deref(), Some("94042"));
    }

    #[test]
    fn postal_code_is_text_after_first_space() {
        let address = parse_city_state_zip("Austin, TX, 78701 1234");
        assert_eq!(address.postal_code.as_deref(), Some("78701 1234"));

        let address = parse_city_state_zip("Austin,TX,78701");
        assert_eq!(address.postal_code.as_deref(), Some("78701"));
    }

    #[test]
    fn missing_parts_are_none() {
        let address = parse_city_state_zip("Austin");
        assert_eq!(address.city.as_deref(), Some("Austin"));
        assert_eq!(address.state, None);
        assert_eq!(address.postal_code, None);
    }
}
