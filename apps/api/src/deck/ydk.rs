use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decks longer than this are rejected before parsing.
pub const MAX_LINES: usize = 120;

const SECTION_MAIN: &str = "#main";
const SECTION_EXTRA: &str = "#extra";
const SECTION_SIDE: &str = "!side";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("deck file must have a .ydk extension")]
    InvalidExtension,

    #[error("deck has {lines} lines, at most {max} are allowed")]
    TooManyLines { lines: usize, max: usize },
}

/// Card ids per deck section, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDeck {
    pub main: Vec<u32>,
    pub extra: Vec<u32>,
    pub side: Vec<u32>,
}

impl SectionDeck {
    /// Main, then extra, then side. Duplicates are kept.
    pub fn card_ids(&self) -> Vec<u32> {
        self.main
            .iter()
            .chain(&self.extra)
            .chain(&self.side)
            .copied()
            .collect()
    }
}

#[derive(Clone, Copy)]
enum Section {
    Main,
    Extra,
    Side,
}

/// Parses YDK deck text.
///
/// Lines before the first section header, blank lines and anything that is not
/// a canonical decimal id (`"0123"`, `"12a"`, `"1.0"`) are skipped.
pub fn parse_ydk(text: &str, filename: Option<&str>) -> Result<SectionDeck, DeckError> {
    if let Some(name) = filename {
        if !name.to_lowercase().ends_with(".ydk") {
            return Err(DeckError::InvalidExtension);
        }
    }

    // Same line count as splitting on \r?\n, trailing empty line included
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > MAX_LINES {
        return Err(DeckError::TooManyLines {
            lines: lines.len(),
            max: MAX_LINES,
        });
    }

    let mut deck = SectionDeck::default();
    let mut current = None;

    for line in lines {
        let trimmed = line.trim();
        match trimmed {
            "" => continue,
            SECTION_MAIN => current = Some(Section::Main),
            SECTION_EXTRA => current = Some(Section::Extra),
            SECTION_SIDE => current = Some(Section::Side),
            _ => {
                let (Some(section), Some(id)) = (current, canonical_id(trimmed)) else {
                    continue;
                };
                match section {
                    Section::Main => deck.main.push(id),
                    Section::Extra => deck.extra.push(id),
                    Section::Side => deck.side.push(id),
                }
            }
        }
    }
    Ok(deck)
}

fn canonical_id(token: &str) -> Option<u32> {
    let id: u32 = token.parse().ok()?;
    (id.to_string() == token).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "#created by ygopro\r\n#main\r\n89631139\r\n89631139\r\n 14558127 \r\n\r\n#extra\r\n44508094\r\n!side\r\n27204311\r\n";

    #[test]
    fn test_parse_sections() {
        let deck = parse_ydk(DECK, Some("blue-eyes.ydk")).unwrap();
        assert_eq!(deck.main, vec![89631139, 89631139, 14558127]);
        assert_eq!(deck.extra, vec![44508094]);
        assert_eq!(deck.side, vec![27204311]);
        assert_eq!(
            deck.card_ids(),
            vec![89631139, 89631139, 14558127, 44508094, 27204311]
        );
    }

    #[test]
    fn test_lines_before_header_are_ignored() {
        let deck = parse_ydk("12345\n#main\n678", None).unwrap();
        assert_eq!(deck.main, vec![678]);
    }

    #[test]
    fn test_non_canonical_ids_are_skipped() {
        let deck = parse_ydk("#main\n0123\n12a\n1.0\n+5\n-7\n42", None).unwrap();
        assert_eq!(deck.main, vec![42]);
    }

    #[test]
    fn test_extension_checked_case_insensitively() {
        assert!(parse_ydk(DECK, Some("DECK.YDK")).is_ok());
        assert_eq!(
            parse_ydk(DECK, Some("deck.txt")),
            Err(DeckError::InvalidExtension)
        );
    }

    #[test]
    fn test_line_limit() {
        let at_limit = "1\n".repeat(MAX_LINES - 1);
        assert!(parse_ydk(&at_limit, None).is_ok());

        let over = "1\n".repeat(MAX_LINES);
        assert_eq!(
            parse_ydk(&over, None),
            Err(DeckError::TooManyLines {
                lines: MAX_LINES + 1,
                max: MAX_LINES
            })
        );
    }

    #[test]
    fn test_empty_text_is_empty_deck() {
        let deck = parse_ydk("", None).unwrap();
        assert!(deck.card_ids().is_empty());
    }
}
