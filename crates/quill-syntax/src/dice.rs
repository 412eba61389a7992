//! Dice notation.
//! 骰子记法。

use std::fmt;

/// How many dice of a roll are kept.
/// 掷骰时保留的骰子数量。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DiceKeep {
    pub highest: Option<u32>,
    pub lowest: Option<u32>,
    pub players_choice: Option<u32>,
}

impl DiceKeep {
    pub fn is_empty(&self) -> bool {
        self.highest.is_none() && self.lowest.is_none() && self.players_choice.is_none()
    }

    /// Rules match when every count matches; a missing count is zero.
    pub fn keep_equals(&self, other: &DiceKeep) -> bool {
        let counts = |keep: &DiceKeep| {
            (
                keep.highest.unwrap_or(0),
                keep.lowest.unwrap_or(0),
                keep.players_choice.unwrap_or(0),
            )
        };
        counts(self) == counts(other)
    }
}

impl fmt::Display for DiceKeep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.highest {
            write!(f, "kh{n}")?;
        }
        if let Some(n) = self.lowest {
            write!(f, "kl{n}")?;
        }
        if let Some(n) = self.players_choice {
            write!(f, "kc{n}")?;
        }
        Ok(())
    }
}

/// The part of a roll after the dice count, e.g. `d6kh2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceNotation {
    pub faces: u32,
    pub keep: DiceKeep,
}

/// Parse `d<faces>` followed by up to three `k[hlc]<n>` rules, ignoring case.
/// Dice without faces are not dice.
/// 解析 `d<面数>` 以及最多三个保留规则。
pub fn parse_dice_notation(word: &str) -> Option<DiceNotation> {
    let word = word.to_ascii_lowercase();
    let mut rest = word.strip_prefix('d')?;

    let (faces, after) = split_number(rest)?;
    if faces == 0 {
        return None;
    }
    rest = after;

    let mut keep = DiceKeep::default();
    let mut rules = 0;
    while !rest.is_empty() {
        rules += 1;
        if rules > 3 {
            return None;
        }
        let mut chars = rest.chars();
        if chars.next() != Some('k') {
            return None;
        }
        let slot = match chars.next() {
            Some('h') => &mut keep.highest,
            Some('l') => &mut keep.lowest,
            Some('c') => &mut keep.players_choice,
            _ => return None,
        };
        let (count, after) = split_number(&rest[2..])?;
        *slot = Some(count);
        rest = after;
    }

    Some(DiceNotation { faces, keep })
}

/// Leading decimal digits of `text` and the remainder.
fn split_number(text: &str) -> Option<(u32, &str)> {
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value = text[..digits].parse().ok()?;
    Some((value, &text[digits..]))
}
