//! Function qualifier encoding.
//!
//! Each extracted function carries a unified symbol id whose last character
//! encodes its `const`/`volatile`/`restrict` qualifiers the way clang does
//! for methods: a digit holding the bit set (const = 1, restrict = 2,
//! volatile = 4), or the `#` sentinel when the function has none.
//!
//! This is the only module that reads or writes that encoding; everything
//! else asks [`decode_qualifiers`] through the declaration index.

use serde::{Deserialize, Serialize};

/// Last character of an id whose function has no qualifiers.
pub const NO_QUALIFIERS: char = '#';

const CONST_BIT: u32 = 1;
const RESTRICT_BIT: u32 = 2;
const VOLATILE_BIT: u32 = 4;

/// cv/restrict qualifier triple of a function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qualifiers {
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_volatile: bool,
    #[serde(default)]
    pub is_restrict: bool,
}

impl Qualifiers {
    pub const NONE: Qualifiers = Qualifiers {
        is_const: false,
        is_volatile: false,
        is_restrict: false,
    };

    pub const CONST: Qualifiers = Qualifiers {
        is_const: true,
        is_volatile: false,
        is_restrict: false,
    };

    fn bits(self) -> u32 {
        let mut bits = 0;
        if self.is_const {
            bits |= CONST_BIT;
        }
        if self.is_restrict {
            bits |= RESTRICT_BIT;
        }
        if self.is_volatile {
            bits |= VOLATILE_BIT;
        }
        bits
    }

    /// Record a qualifier keyword as it appears after a parameter list.
    pub fn add_keyword(&mut self, keyword: &str) {
        match keyword {
            "const" => self.is_const = true,
            "volatile" => self.is_volatile = true,
            "restrict" | "__restrict" | "__restrict__" => self.is_restrict = true,
            _ => {}
        }
    }
}

/// Append the qualifier suffix to a symbol id body.
pub fn encode_qualifiers(usr: &mut String, qualifiers: Qualifiers) {
    match qualifiers.bits() {
        0 => usr.push(NO_QUALIFIERS),
        bits => {
            usr.push(NO_QUALIFIERS);
            usr.push_str(&bits.to_string());
        }
    }
}

/// Decode the qualifier triple from the trailing character of a symbol id.
///
/// Ids ending in the sentinel, or in anything that is not a qualifier digit,
/// have no qualifiers.
pub fn decode_qualifiers(usr: &str) -> Qualifiers {
    let bits = match usr.chars().last().and_then(|c| c.to_digit(10)) {
        Some(bits) => bits,
        None => return Qualifiers::NONE,
    };
    Qualifiers {
        is_const: bits & CONST_BIT != 0,
        is_volatile: bits & VOLATILE_BIT != 0,
        is_restrict: bits & RESTRICT_BIT != 0,
    }
}
