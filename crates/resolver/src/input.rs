//! Raw numeric input coming from text fields and sliders.

/// A value typed or dragged into a numeric control.
///
/// Sliders and steppers deliver numbers; text boxes deliver whatever the
/// user typed. Both go through the same setters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericInput<'a> {
    Value(f64),
    Text(&'a str),
}

impl NumericInput<'_> {
    /// The finite number this input denotes, if any.
    ///
    /// Text is trimmed before parsing. Non-finite values count as
    /// unparseable so that later clamping always sees a real number.
    pub fn parse(self) -> Option<f64> {
        let value = match self {
            NumericInput::Value(v) => v,
            NumericInput::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for NumericInput<'_> {
    fn from(value: f64) -> Self {
        NumericInput::Value(value)
    }
}

impl From<i64> for NumericInput<'_> {
    fn from(value: i64) -> Self {
        NumericInput::Value(value as f64)
    }
}

impl From<u32> for NumericInput<'_> {
    fn from(value: u32) -> Self {
        NumericInput::Value(f64::from(value))
    }
}

impl<'a> From<&'a str> for NumericInput<'a> {
    fn from(text: &'a str) -> Self {
        NumericInput::Text(text)
    }
}

impl<'a> From<&'a String> for NumericInput<'a> {
    fn from(text: &'a String) -> Self {
        NumericInput::Text(text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(NumericInput::from(" 42 ").parse(), Some(42.0));
        assert_eq!(NumericInput::from("-3.5").parse(), Some(-3.5));
    }

    #[test]
    fn test_garbage_and_non_finite_are_rejected() {
        assert_eq!(NumericInput::from("abc").parse(), None);
        assert_eq!(NumericInput::from("").parse(), None);
        assert_eq!(NumericInput::from("NaN").parse(), None);
        assert_eq!(NumericInput::from(f64::INFINITY).parse(), None);
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(NumericInput::from(7i64).parse(), Some(7.0));
        assert_eq!(NumericInput::from(3u32).parse(), Some(3.0));
    }
}
