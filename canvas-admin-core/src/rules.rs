//! Rule Library - Pure Field Predicates
//!
//! A rule maps a candidate value to `Ok(())` or the message to show.
//! Rules hold no state; `MinLength` carries only its parameter.

use once_cell::sync::Lazy;
use regex::Regex;

pub const REQUIRED_MESSAGE: &str = "Please fill in this field";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const REQUIRED_TAGS_MESSAGE: &str = "Please select at least one tag";

pub type RuleResult = Result<(), String>;

/// Validation rule trait - a single link in a field's rule chain
pub trait Rule<V: ?Sized> {
    fn name(&self) -> &'static str;
    fn check(&self, value: &V) -> RuleResult;
}

/// How a value reads to `required` and to skip-empty mode.
///
/// `is_present` follows truthiness: `0`, `false`, `""` and missing values
/// are absent. `is_blank` is narrower and only covers "nothing entered":
/// missing values, whitespace-only strings and empty collections.
pub trait FieldInput {
    fn is_present(&self) -> bool;
    fn is_blank(&self) -> bool;
}

impl FieldInput for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }

    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl FieldInput for String {
    fn is_present(&self) -> bool {
        self.as_str().is_present()
    }

    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

impl<T> FieldInput for [T] {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }

    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> FieldInput for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }

    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: FieldInput> FieldInput for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().map_or(false, FieldInput::is_present)
    }

    fn is_blank(&self) -> bool {
        self.as_ref().map_or(true, FieldInput::is_blank)
    }
}

impl FieldInput for bool {
    fn is_present(&self) -> bool {
        *self
    }

    fn is_blank(&self) -> bool {
        false
    }
}

macro_rules! integer_input {
    ($($ty:ty),*) => {
        $(
            impl FieldInput for $ty {
                fn is_present(&self) -> bool {
                    *self != 0
                }

                fn is_blank(&self) -> bool {
                    false
                }
            }
        )*
    };
}

integer_input!(i32, i64, u32, u64, usize);

impl FieldInput for f64 {
    fn is_present(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }

    fn is_blank(&self) -> bool {
        false
    }
}

// --- Concrete Rules ---

/// Rejects absent values. Numeric zero counts as absent.
pub struct Required;

impl<V: FieldInput + ?Sized> Rule<V> for Required {
    fn name(&self) -> &'static str { "required" }

    fn check(&self, value: &V) -> RuleResult {
        if value.is_present() {
            Ok(())
        } else {
            Err(REQUIRED_MESSAGE.to_string())
        }
    }
}

/// `local@domain.tld` shape only, not RFC 5322.
pub struct Email;

impl<V: AsRef<str> + ?Sized> Rule<V> for Email {
    fn name(&self) -> &'static str { "email" }

    fn check(&self, value: &V) -> RuleResult {
        if looks_like_email(value.as_ref()) {
            Ok(())
        } else {
            Err(EMAIL_MESSAGE.to_string())
        }
    }
}

/// Minimum length in UTF-16 code units.
pub struct MinLength(pub usize);

impl<V: AsRef<str> + ?Sized> Rule<V> for MinLength {
    fn name(&self) -> &'static str { "min_length" }

    fn check(&self, value: &V) -> RuleResult {
        if value.as_ref().encode_utf16().count() >= self.0 {
            Ok(())
        } else {
            Err(format!("Password must be at least {} characters", self.0))
        }
    }
}

/// At least one tag; tag content is not inspected.
pub struct RequiredTags;

impl<T> Rule<[T]> for RequiredTags {
    fn name(&self) -> &'static str { "required_tags" }

    fn check(&self, value: &[T]) -> RuleResult {
        if value.is_empty() {
            Err(REQUIRED_TAGS_MESSAGE.to_string())
        } else {
            Ok(())
        }
    }
}

impl<T> Rule<Vec<T>> for RequiredTags {
    fn name(&self) -> &'static str { "required_tags" }

    fn check(&self, value: &Vec<T>) -> RuleResult {
        <Self as Rule<[T]>>::check(self, value.as_slice())
    }
}

/// Ad-hoc rule built from a closure.
pub struct FnRule<F> {
    name: &'static str,
    check: F,
}

impl<F> FnRule<F> {
    pub fn new(name: &'static str, check: F) -> Self {
        Self { name, check }
    }
}

impl<V: ?Sized, F> Rule<V> for FnRule<F>
where
    F: Fn(&V) -> RuleResult,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn check(&self, value: &V) -> RuleResult {
        (self.check)(value)
    }
}

/// One character that is neither `@` nor whitespace as browsers define
/// `\s`. Unicode `White_Space` differs: it has U+0085 and lacks U+FEFF.
const EMAIL_ATOM: &str =
    r"[^@\t\n\x{0B}\x{0C}\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]";

/// `local@domain.tld`, with `\s` taken in the browser's sense.
fn looks_like_email(value: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        let pattern = format!("^{EMAIL_ATOM}+@{EMAIL_ATOM}+\\.{EMAIL_ATOM}+$");
        Regex::new(&pattern).expect("valid regex")
    });
    RE.is_match(value)
}
