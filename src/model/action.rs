use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of action slots every set carries.
pub const MAX_ACTIONS: usize = 20;

/// Delay (seconds) used whenever a delay is missing or unusable.
pub const DEFAULT_DELAY_SECS: f64 = 0.5;

/// An absolute screen position.
#[derive(
    Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which click is performed once the pointer reaches the action's position.
#[derive(
    Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum ClickType {
    #[default]
    Left,
    Right,
    Double,
}

impl std::str::FromStr for ClickType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" => Ok(ClickType::Left),
            "right" | "r" => Ok(ClickType::Right),
            "double" | "d" => Ok(ClickType::Double),
            other => Err(format!("unknown click type '{other}' (expected left, right or double)")),
        }
    }
}

/// One recordable operation inside a set slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub label: String,
    pub position: Option<Position>,
    pub click_type: ClickType,
    /// Typed after the click when non-empty.
    pub text: String,
    /// Seconds waited after the action fires. Always finite and non-negative.
    pub delay: f64,
    /// Playback order within the owning set; ties fall back to slot index.
    pub order: i32,
}

impl Action {
    /// The one place slot defaults are decided. Set creation, document
    /// decoding and slot clearing all go through here.
    pub fn empty(slot: usize) -> Self {
        Self {
            label: default_label(slot),
            position: None,
            click_type: ClickType::Left,
            text: String::new(),
            delay: DEFAULT_DELAY_SECS,
            order: slot as i32,
        }
    }

    pub fn is_recorded(&self) -> bool {
        self.position.is_some()
    }

    pub fn set_delay(&mut self, secs: f64) {
        self.delay = sanitize_delay(secs);
    }
}

/// Label an untouched slot carries.
pub fn default_label(slot: usize) -> String {
    format!("Point {}", slot + 1)
}

/// Label a slot gets once its first position is recorded while still default.
pub fn recorded_label(slot: usize, position: Position) -> String {
    format!("Point {}: {}", slot + 1, position)
}

/// Replace unusable delays with the default.
pub fn sanitize_delay(secs: f64) -> f64 {
    if secs.is_finite() && secs >= 0.0 {
        secs
    } else {
        DEFAULT_DELAY_SECS
    }
}

/// Parse a user-entered delay. Anything that is not a non-negative number
/// becomes the default delay.
pub fn parse_delay(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .map(sanitize_delay)
        .unwrap_or(DEFAULT_DELAY_SECS)
}

/// Partial update merged into an existing action.
///
/// `position` is doubly optional: `None` leaves it alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ActionUpdate {
    pub label: Option<String>,
    pub click_type: Option<ClickType>,
    pub text: Option<String>,
    pub delay: Option<f64>,
    pub order: Option<i32>,
    pub position: Option<Option<Position>>,
}

impl ActionUpdate {
    pub(crate) fn apply_to(self, action: &mut Action) {
        if let Some(label) = self.label {
            action.label = label;
        }
        if let Some(click_type) = self.click_type {
            action.click_type = click_type;
        }
        if let Some(text) = self.text {
            action.text = text;
        }
        if let Some(delay) = self.delay {
            action.set_delay(delay);
        }
        if let Some(order) = self.order {
            action.order = order;
        }
        if let Some(position) = self.position {
            action.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_action_defaults() {
        let a = Action::empty(3);
        assert_eq!(a.label, "Point 4");
        assert_eq!(a.order, 3);
        assert_eq!(a.delay, DEFAULT_DELAY_SECS);
        assert_eq!(a.click_type, ClickType::Left);
        assert!(a.text.is_empty());
        assert!(!a.is_recorded());
    }

    #[test]
    fn delay_sanitizing() {
        assert_eq!(parse_delay("1.25"), 1.25);
        assert_eq!(parse_delay(" 0 "), 0.0);
        assert_eq!(parse_delay("-1"), DEFAULT_DELAY_SECS);
        assert_eq!(parse_delay("abc"), DEFAULT_DELAY_SECS);
        assert_eq!(parse_delay("NaN"), DEFAULT_DELAY_SECS);
        assert_eq!(sanitize_delay(f64::INFINITY), DEFAULT_DELAY_SECS);
    }

    #[test]
    fn update_keeps_position_unless_supplied() {
        let mut a = Action::empty(0);
        a.position = Some(Position::new(10, 20));

        ActionUpdate {
            label: Some("Login".into()),
            delay: Some(-3.0),
            ..Default::default()
        }
        .apply_to(&mut a);
        assert_eq!(a.label, "Login");
        assert_eq!(a.delay, DEFAULT_DELAY_SECS);
        assert_eq!(a.position, Some(Position::new(10, 20)));

        ActionUpdate {
            position: Some(None),
            ..Default::default()
        }
        .apply_to(&mut a);
        assert_eq!(a.position, None);
    }

    #[test]
    fn click_type_parsing() {
        assert_eq!("Right".parse::<ClickType>(), Ok(ClickType::Right));
        assert_eq!("d".parse::<ClickType>(), Ok(ClickType::Double));
        assert!("middle".parse::<ClickType>().is_err());
    }
}
