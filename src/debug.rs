//! Live-editable debug fields for scene content.
//!
//! Scene elements register labelled fields bound to the property they tune.
//! A write through the panel lands on the bound property immediately; number
//! fields snap to their step and clamp to their range first, so a host UI (or
//! script) can push any value without pushing the scene out of bounds.

use std::fmt;

use crate::data_structures::color::Color;

/// Allowed values of a number field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumberRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl NumberRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Snaps to the step grid, then clamps into `min..=max`.
    pub fn apply(&self, value: f32) -> f32 {
        let snapped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }
}

/// Snapshot of a field for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue {
    Number { value: f32, range: NumberRange },
    Color(Color),
}

enum Control {
    Number {
        range: NumberRange,
        get: Box<dyn Fn() -> f32>,
        set: Box<dyn Fn(f32)>,
    },
    Color {
        get: Box<dyn Fn() -> Color>,
        set: Box<dyn Fn(Color)>,
    },
}

impl Control {
    fn value(&self) -> FieldValue {
        match self {
            Control::Number { range, get, .. } => FieldValue::Number {
                value: get(),
                range: *range,
            },
            Control::Color { get, .. } => FieldValue::Color(get()),
        }
    }
}

struct Field {
    label: String,
    control: Control,
}

pub struct DebugPanel {
    title: String,
    fields: Vec<Field>,
}

impl DebugPanel {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_number(
        &mut self,
        label: &str,
        range: NumberRange,
        get: impl Fn() -> f32 + 'static,
        set: impl Fn(f32) + 'static,
    ) -> &mut Self {
        self.fields.push(Field {
            label: label.to_string(),
            control: Control::Number {
                range,
                get: Box::new(get),
                set: Box::new(set),
            },
        });
        self
    }

    pub fn add_color(
        &mut self,
        label: &str,
        get: impl Fn() -> Color + 'static,
        set: impl Fn(Color) + 'static,
    ) -> &mut Self {
        self.fields.push(Field {
            label: label.to_string(),
            control: Control::Color {
                get: Box::new(get),
                set: Box::new(set),
            },
        });
        self
    }

    /// Writes a number field and returns the value actually applied.
    pub fn set_number(&self, label: &str, value: f32) -> anyhow::Result<f32> {
        if !value.is_finite() {
            anyhow::bail!("{} must be a finite number, got {}", label, value);
        }
        match &self.field(label)?.control {
            Control::Number { range, set, .. } => {
                let applied = range.apply(value);
                set(applied);
                Ok(applied)
            }
            Control::Color { .. } => anyhow::bail!("{} is a colour field", label),
        }
    }

    pub fn set_color(&self, label: &str, color: Color) -> anyhow::Result<()> {
        match &self.field(label)?.control {
            Control::Color { set, .. } => {
                set(color);
                Ok(())
            }
            Control::Number { .. } => anyhow::bail!("{} is a number field", label),
        }
    }

    pub fn value(&self, label: &str) -> Option<FieldValue> {
        self.field(label).ok().map(|field| field.control.value())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldValue)> {
        self.fields
            .iter()
            .map(|field| (field.label.as_str(), field.control.value()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Drops every field and with it the bindings' handles into the scene.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    fn field(&self, label: &str) -> anyhow::Result<&Field> {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .ok_or_else(|| anyhow::anyhow!("no debug field labelled {:?}", label))
    }
}

impl fmt::Debug for DebugPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugPanel")
            .field("title", &self.title)
            .field("fields", &self.fields.iter().map(|x| &x.label).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    fn panel_with_position() -> (DebugPanel, Rc<Cell<f32>>) {
        let x = Rc::new(Cell::new(0.0));
        let mut panel = DebugPanel::new("test");
        let (get, set) = (x.clone(), x.clone());
        panel.add_number(
            "X",
            NumberRange::new(-10.0, 10.0, 0.001),
            move || get.get(),
            move |v| set.set(v),
        );
        (panel, x)
    }

    #[test]
    fn out_of_range_writes_clamp_to_the_nearest_boundary() {
        let (panel, x) = panel_with_position();

        assert_eq!(panel.set_number("X", 25.0).unwrap(), 10.0);
        assert_eq!(x.get(), 10.0);
        assert_eq!(panel.set_number("X", -1e6).unwrap(), -10.0);
        assert_eq!(x.get(), -10.0);
    }

    #[test]
    fn in_range_writes_snap_to_step() {
        let (panel, x) = panel_with_position();

        let applied = panel.set_number("X", 1.23449).unwrap();

        assert!((applied - 1.234).abs() < 1e-5);
        assert_eq!(x.get(), applied);
    }

    #[test]
    fn rejects_non_finite_and_unknown_fields() {
        let (panel, x) = panel_with_position();

        assert!(panel.set_number("X", f32::NAN).is_err());
        assert!(panel.set_number("Y", 1.0).is_err());
        assert!(panel.set_color("X", Color::WHITE).is_err());
        assert_eq!(x.get(), 0.0);
    }

    #[test]
    fn lists_current_values() {
        let (panel, x) = panel_with_position();
        x.set(2.5);

        let fields: Vec<_> = panel.fields().collect();

        assert_eq!(fields.len(), 1);
        assert!(matches!(fields[0], ("X", FieldValue::Number { value, .. }) if value == 2.5));
    }
}
