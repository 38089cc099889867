use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// Turns name parts into the text shown in a reminder. The scheduling engine treats it as
/// opaque; closures with the same signature work as formatters too.
pub trait DisplayNameFormatter: Send + Sync {
    fn format(&self, first_name: &str, last_name: &str, direction: TextDirection) -> String;
}

impl<F> DisplayNameFormatter for F
where
    F: Fn(&str, &str, TextDirection) -> String + Send + Sync,
{
    fn format(&self, first_name: &str, last_name: &str, direction: TextDirection) -> String {
        self(first_name, last_name, direction)
    }
}

const RIGHT_TO_LEFT_ISOLATE: char = '\u{2067}';
const POP_DIRECTIONAL_ISOLATE: char = '\u{2069}';

/// "First Last", wrapped in a right-to-left isolate when the direction asks for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainNameFormatter;

impl DisplayNameFormatter for PlainNameFormatter {
    fn format(&self, first_name: &str, last_name: &str, direction: TextDirection) -> String {
        let name = [first_name.trim(), last_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        match direction {
            TextDirection::LeftToRight => name,
            TextDirection::RightToLeft => {
                format!("{RIGHT_TO_LEFT_ISOLATE}{name}{POP_DIRECTIONAL_ISOLATE}")
            }
        }
    }
}
